//! Writing the document and driving the external compiler and viewer

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use super::config::ToolchainConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const MAX_STDERR_CHARS: usize = 2000;

/// Failure of an external process; never affects the document model
#[derive(Debug, Error)]
pub enum ExternalToolError {
    /// The program could not be started
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and reported failure
    #[error("'{program}' exited with {status}{}", stderr_suffix(.stderr))]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    /// The program exceeded its time budget and was killed
    #[error("'{program}' timed out after {}ms and was killed", .timeout.as_millis())]
    TimedOut { program: String, timeout: Duration },

    /// Waiting on the program failed
    #[error("failed to wait for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!(": {}", stderr.trim())
    }
}

/// Errors from a compile request
#[derive(Debug, Error)]
pub enum CompileError {
    /// The document file could not be written
    #[error("failed to write document to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Tool(#[from] ExternalToolError),

    /// The compile worker is no longer running
    #[error("compile worker is not running")]
    WorkerGone,
}

/// One successful external process run
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRun {
    pub program: String,
    pub elapsed: Duration,
}

/// Outcome of a successful compile
#[derive(Debug, Clone, PartialEq)]
pub struct CompileReport {
    /// Where the document source was written
    pub path: PathBuf,
    pub compiler: ToolRun,
    pub viewer: Option<ToolRun>,
}

/// Writes rendered documents and runs the configured tools on them
///
/// Tools run with `output_dir` as their working directory and receive the
/// document's file name as their last argument; the process-wide working
/// directory is never changed.
#[derive(Debug, Clone)]
pub struct Toolchain {
    config: ToolchainConfig,
}

impl Toolchain {
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    /// Write `source` to the target path without running any tool
    pub fn write(&self, source: &str) -> Result<PathBuf, CompileError> {
        let path = self.config.target_path();
        let write_err = |source| CompileError::Write {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(&self.config.output_dir).map_err(write_err)?;
        std::fs::write(&path, source).map_err(write_err)?;
        Ok(path)
    }

    /// Write `source`, run the compiler, then the viewer if one is configured
    pub fn compile(&self, source: &str) -> Result<CompileReport, CompileError> {
        let path = self.write(source).map_err(|err| {
            log::warn!("event=document_write status=failed error={}", err);
            err
        })?;
        log::info!("event=document_write status=ok path={}", path.display());

        let compiler = self
            .run(&self.config.compiler, &self.config.compiler_args)
            .map_err(log_tool_failure)?;
        let viewer = match &self.config.viewer {
            Some(program) => Some(
                self.run(program, &self.config.viewer_args)
                    .map_err(log_tool_failure)?,
            ),
            None => None,
        };

        Ok(CompileReport {
            path,
            compiler,
            viewer,
        })
    }

    fn run(&self, program: &str, args: &[String]) -> Result<ToolRun, ExternalToolError> {
        let started = Instant::now();
        let deadline = started + self.config.timeout();
        let mut child = Command::new(program)
            .args(args)
            .arg(&self.config.filename)
            .current_dir(&self.config.output_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExternalToolError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let stderr_chunks = spawn_stderr_reader(child.stderr.take());

        let status = wait_until(&mut child, program, deadline, self.config.timeout())?;
        let elapsed = started.elapsed();
        if status.success() {
            log::info!(
                "event=tool_run status=ok program={} elapsed_ms={}",
                program,
                elapsed.as_millis()
            );
            return Ok(ToolRun {
                program: program.to_string(),
                elapsed,
            });
        }

        Err(ExternalToolError::Failed {
            program: program.to_string(),
            status,
            stderr: collect_stderr(&stderr_chunks, deadline),
        })
    }
}

/// Forward stderr in chunks from a helper thread.
///
/// The pipe stays open as long as any descendant of the tool holds it, so
/// the reader is never joined; callers drain it against a deadline.
fn spawn_stderr_reader(pipe: Option<ChildStderr>) -> Receiver<Vec<u8>> {
    let (sender, receiver) = mpsc::channel();
    if let Some(mut pipe) = pipe {
        thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match pipe.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if sender.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }
    receiver
}

/// Everything the tool wrote to stderr before EOF or `deadline`
fn collect_stderr(chunks: &Receiver<Vec<u8>>, deadline: Instant) -> String {
    let mut bytes = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match chunks.recv_timeout(remaining) {
            Ok(chunk) => bytes.extend(chunk),
            Err(_) => break,
        }
    }
    truncate(&String::from_utf8_lossy(&bytes), MAX_STDERR_CHARS)
}

/// Poll `child` until it exits or `deadline` passes; on timeout it is killed
fn wait_until(
    child: &mut Child,
    program: &str,
    deadline: Instant,
    timeout: Duration,
) -> Result<ExitStatus, ExternalToolError> {
    let wait_err = |source| ExternalToolError::Wait {
        program: program.to_string(),
        source,
    };

    loop {
        if let Some(status) = child.try_wait().map_err(wait_err)? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            // The process may exit between the check and the kill
            let _ = child.kill();
            child.wait().map_err(wait_err)?;
            return Err(ExternalToolError::TimedOut {
                program: program.to_string(),
                timeout,
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn log_tool_failure(err: ExternalToolError) -> ExternalToolError {
    log::warn!("event=tool_run status=failed error={}", err);
    err
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
