//! Inkmath CLI
//!
//! Usage:
//!   inkmath [OPTIONS] <COMMAND>
//!
//! Commands:
//!   classify    Print the predicted symbol id for every stroke
//!   transcribe  Append the recognized symbols to a document and compile it
//!   symbols     List the symbols the registry knows
//!
//! Options:
//!   -c, --config <FILE>      Configuration file (TOML format)
//!   -l, --log-level <LEVEL>  off, error, warn, info, debug or trace
//!       --log-dir <DIR>      Also write rotated log files to this directory
//!   -h, --help               Print help

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use inkmath::{logging, AppConfig, Pipeline, PipelineError, SymbolRegistry};

const DEFAULT_CONFIG: &str = "inkmath.toml";

#[derive(Parser)]
#[command(name = "inkmath")]
#[command(about = "Recognize handwritten strokes and assemble them into LaTeX")]
struct Cli {
    /// Configuration file (TOML format); defaults to ./inkmath.toml if present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,

    /// Also write rotated log files to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the predicted symbol id for every stroke, one per line
    Classify {
        /// Stroke payload file (reads from stdin if not provided)
        payload: Option<PathBuf>,
    },

    /// Append the recognized symbols to a document, write it and compile it
    Transcribe {
        /// Stroke payload file (reads from stdin if not provided)
        payload: Option<PathBuf>,

        /// Only write the document; do not run the compiler or viewer
        #[arg(long)]
        no_compile: bool,
    },

    /// List the symbols the registry knows
    Symbols,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&cli.log_level, cli.log_dir.as_deref()) {
        eprintln!("Error initializing logging: {}", e);
        std::process::exit(1);
    }

    let config = load_config(cli.config.as_deref());

    match cli.command {
        Command::Symbols => {
            let registry = match SymbolRegistry::from_file(&config.registry.path) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!(
                        "Error loading registry '{}': {}",
                        config.registry.path.display(),
                        e
                    );
                    std::process::exit(1);
                }
            };
            print_symbols(&registry);
        }
        Command::Classify { payload } => {
            let pipeline = load_pipeline(&config);
            let (source, name) = read_payload(payload.as_deref());
            match pipeline.recognize(&source) {
                Ok(ids) => {
                    for id in ids {
                        println!("{}", id);
                    }
                }
                Err(e) => exit_with(e, &source, &name),
            }
        }
        Command::Transcribe {
            payload,
            no_compile,
        } => {
            let pipeline = load_pipeline(&config);
            let (source, name) = read_payload(payload.as_deref());
            let mut document = pipeline.new_document();
            if let Err(e) = pipeline.transcribe(&source, &mut document) {
                exit_with(e, &source, &name);
            }

            let toolchain = pipeline.toolchain();
            let outcome = if no_compile {
                toolchain.write(&document.render()).map(|path| {
                    eprintln!("Wrote {}", path.display());
                })
            } else {
                document.compile(&toolchain).map(|report| {
                    eprintln!(
                        "Compiled {} with {} in {}ms",
                        report.path.display(),
                        report.compiler.program,
                        report.compiler.elapsed.as_millis()
                    );
                })
            };
            print!("{}", document.render());

            // The document is complete either way; only the tools failed
            if let Err(e) = outcome {
                eprintln!("Error: {}", e);
                std::process::exit(2);
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> AppConfig {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG);
            if !default.exists() {
                return AppConfig::default();
            }
            default
        }
    };
    match AppConfig::from_file(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn load_pipeline(config: &AppConfig) -> Pipeline {
    match Pipeline::load(config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn read_payload(path: Option<&Path>) -> (String, String) {
    match path {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

fn exit_with(err: PipelineError, source: &str, name: &str) -> ! {
    match &err {
        PipelineError::Parse(parse) => eprint!("{}", parse.format(source, name)),
        other => eprintln!("Error: {}", other),
    }
    std::process::exit(1);
}

fn print_symbols(registry: &SymbolRegistry) {
    for id in registry.ids() {
        if let Ok(info) = registry.lookup(id) {
            let mode = if info.mathmode { "math" } else { "text" };
            match &info.package {
                Some(package) => println!("{}\t{}\t{}\t{}", id, info.command, mode, package),
                None => println!("{}\t{}\t{}", id, info.command, mode),
            }
        }
    }
}
