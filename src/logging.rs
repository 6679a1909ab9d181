//! Process-wide logging setup
//!
//! Diagnostics go to stderr. When a log directory is given they are also
//! written to size-rotated files inside it. Initialization happens at most
//! once per process and never panics.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
};
use thiserror::Error;

const LOG_FILE_BASENAME: &str = "inkmath";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

static LOGGER: OnceLock<LoggerHandle> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unsupported log level '{0}'; expected one of off, error, warn, info, debug, trace")]
    Level(String),

    #[error("failed to create log directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start logger: {0}")]
    Backend(#[from] FlexiLoggerError),
}

/// Start logging at `level`.
///
/// `RUST_LOG`, when set, takes precedence over `level`. Calling this again
/// after a successful init is a no-op.
pub fn init(level: &str, log_dir: Option<&Path>) -> Result<(), LoggingError> {
    let level = normalize_level(level)?;
    if LOGGER.get().is_some() {
        return Ok(());
    }

    let logger = Logger::try_with_env_or_str(level)?;
    let handle = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::Directory {
                path: dir.to_path_buf(),
                source,
            })?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir)
                        .basename(LOG_FILE_BASENAME)
                        .suppress_timestamp(),
                )
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .duplicate_to_stderr(Duplicate::All)
                .format_for_files(flexi_logger::detailed_format)
                .format_for_stderr(flexi_logger::default_format)
                .start()?
        }
        None => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::default_format)
            .start()?,
    };

    // A concurrent init may have won; its handle stays authoritative
    let _ = LOGGER.set(handle);
    log::debug!(
        "event=logging_init status=ok level={} dir={}",
        level,
        log_dir.map(|d| d.display().to_string()).unwrap_or_default()
    );
    Ok(())
}

fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    let lowered = level.trim().to_ascii_lowercase();
    LEVELS
        .iter()
        .find(|known| **known == lowered)
        .copied()
        .ok_or_else(|| LoggingError::Level(level.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("INFO").unwrap(), "info");
        assert_eq!(normalize_level(" debug ").unwrap(), "debug");
        assert!(matches!(
            normalize_level("verbose"),
            Err(LoggingError::Level(_))
        ));
    }

    #[test]
    fn test_invalid_level_rejected_before_init() {
        assert!(init("loud", None).is_err());
    }
}
