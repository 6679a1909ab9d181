//! Error types for payload parsing

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Parse error at line {line}, column {column}: {message}")]
    Payload {
        span: Span,
        line: usize,
        column: usize,
        message: String,
    },
}

impl ParseError {
    /// Build a parse error from a `serde_json` failure on `source`
    pub fn from_json(err: &serde_json::Error, source: &str) -> Self {
        let line = err.line();
        let column = err.column();
        let full = err.to_string();
        let suffix = format!(" at line {} column {}", line, column);
        let message = full.strip_suffix(&suffix).unwrap_or(&full).to_string();

        let start = byte_offset(source, line, column);
        let end = (start + 1).min(source.len()).max(start);

        ParseError::Payload {
            span: start..end,
            line,
            column,
            message,
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            ParseError::Payload { span, .. } => span,
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        match self {
            ParseError::Payload { span, message, .. } => {
                let written = Report::build(ReportKind::Error, filename, span.start)
                    .with_message("malformed stroke payload")
                    .with_label(
                        Label::new((filename, span.clone()))
                            .with_message(message)
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf);
                if written.is_err() {
                    return self.to_string();
                }
            }
        }
        String::from_utf8(buf).unwrap_or_else(|_| self.to_string())
    }
}

/// Convert a 1-based line/column position into a byte offset
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len())
}
