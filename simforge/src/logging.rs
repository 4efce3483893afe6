//! Logging infrastructure.
//!
//! Structured logging with dual output:
//! - Writes to a log file under the configured logging directory
//!   (cleared on startup)
//! - Also prints to stdout for CLI tailing
//! - `RUST_LOG` overrides the configured level when set

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the logging system.
///
/// Creates the log directory if needed, clears the previous log file,
/// and sets up dual output to both file and stdout. The filter comes
/// from `RUST_LOG` when set, otherwise from `level`.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the log
/// file cannot be cleared.
pub fn init_logging(
    directory: &Path,
    file_name: &str,
    level: &str,
) -> Result<LoggingGuard, io::Error> {
    prepare_log_file(directory, file_name)?;

    // File appender with a non-blocking writer.
    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false) // No ANSI colors in file
        .with_span_events(FmtSpan::CLOSE)
        .pretty();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true) // ANSI colors for terminal
        .with_span_events(FmtSpan::CLOSE)
        .pretty();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Creates the log directory and truncates any previous log file.
///
/// Returns the full path of the prepared log file.
fn prepare_log_file(directory: &Path, file_name: &str) -> Result<PathBuf, io::Error> {
    fs::create_dir_all(directory)?;

    // Writing empty content handles both existing and missing files.
    let log_path = directory.join(file_name);
    fs::write(&log_path, "")?;
    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_creates_directory_and_empty_file() {
        let dir = TempDir::new().unwrap();
        let log_dir = dir.path().join("logs");
        assert!(!log_dir.exists());

        let log_path = prepare_log_file(&log_dir, "test.log").unwrap();

        assert!(log_dir.exists());
        assert_eq!(log_path, log_dir.join("test.log"));
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "");
    }

    #[test]
    fn test_prepare_clears_existing_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("test.log"), "old log data").unwrap();

        let log_path = prepare_log_file(dir.path(), "test.log").unwrap();

        assert_eq!(fs::read_to_string(&log_path).unwrap(), "");
    }

    #[test]
    fn test_prepare_creates_nested_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("deep").join("nested");

        let log_path = prepare_log_file(&nested, "test.log").unwrap();

        assert!(log_path.exists());
    }

    #[test]
    fn test_guard_structure() {
        // Only verifies the guard can be built and dropped; init_logging
        // itself installs a global subscriber and cannot run per-test.
        use tracing_appender::non_blocking::NonBlocking;

        let (non_blocking, guard) = NonBlocking::new(std::io::sink());
        drop(non_blocking);

        let _logging_guard = LoggingGuard { _file_guard: guard };
    }
}
