//! Configuration for document rendering and the external toolchain

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Fixed templates wrapped around the assembled notes
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Emitted first, before any package lines
    pub preamble: String,

    /// Opens the body after the package lines
    pub body_begin: String,

    /// Placed between consecutive notes
    pub separator: String,

    /// Emitted last, after the body
    pub epilogue: String,

    /// Opening math delimiter for math-mode symbols
    pub math_open: String,

    /// Closing math delimiter for math-mode symbols
    pub math_close: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            preamble: "\\documentclass[12pt,oneside]{article}\n\\usepackage[margin=1in]{geometry}\n"
                .to_string(),
            body_begin: "\\begin{document}\n".to_string(),
            separator: " ".to_string(),
            epilogue: "\\end{document}\n".to_string(),
            math_open: "$".to_string(),
            math_close: "$".to_string(),
        }
    }
}

impl DocumentConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the preamble
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    /// Set the note separator
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the epilogue
    pub fn with_epilogue(mut self, epilogue: impl Into<String>) -> Self {
        self.epilogue = epilogue.into();
        self
    }

    /// Set both math delimiters
    pub fn with_math_delimiters(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.math_open = open.into();
        self.math_close = close.into();
        self
    }
}

/// Where the document is written and which external tools process it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Directory the document is written to; tools run inside it
    pub output_dir: PathBuf,

    /// Document file name, passed to the tools relative to `output_dir`
    pub filename: String,

    /// Compiler program name
    pub compiler: String,

    /// Arguments placed before the file name
    pub compiler_args: Vec<String>,

    /// Viewer program name; `None` skips the viewer. An empty string in a
    /// config file also disables it.
    #[serde(deserialize_with = "empty_as_none")]
    pub viewer: Option<String>,

    /// Arguments placed before the file name
    pub viewer_args: Vec<String>,

    /// Upper bound for each external process, in milliseconds
    pub timeout_ms: u64,
}

fn empty_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|program| !program.trim().is_empty()))
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("latex_file"),
            filename: "notes.tex".to_string(),
            compiler: "latexmk".to_string(),
            compiler_args: Vec::new(),
            viewer: Some("code".to_string()),
            viewer_args: Vec::new(),
            timeout_ms: 60_000,
        }
    }
}

impl ToolchainConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the document file name
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Set the compiler program and its leading arguments
    pub fn with_compiler<I, S>(mut self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compiler = program.into();
        self.compiler_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the viewer program and its leading arguments
    pub fn with_viewer<I, S>(mut self, program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.viewer = Some(program.into());
        self.viewer_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Do not launch a viewer after compiling
    pub fn without_viewer(mut self) -> Self {
        self.viewer = None;
        self.viewer_args.clear();
        self
    }

    /// Set the per-process timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Full path of the document file
    pub fn target_path(&self) -> PathBuf {
        self.output_dir.join(&self.filename)
    }
}
