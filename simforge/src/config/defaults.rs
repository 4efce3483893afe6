//! Default values and constants for all configuration settings.
//!
//! Contains the `DEFAULT_*` constants, path helpers, and the
//! `ConfigFile::default()` implementation.

use std::path::PathBuf;

use super::settings::*;

// =============================================================================
// Executor defaults
// =============================================================================

/// Default number of jobs allowed to execute concurrently.
///
/// Scientific runs are large; two concurrent jobs keeps a workstation
/// responsive while one long job and one short job share it.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 2;

/// Default work units per chunk.
pub const DEFAULT_CHUNK_SIZE: u64 = crate::executor::DEFAULT_CHUNK_SIZE;

/// Default work units between restart checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = crate::executor::DEFAULT_CHECKPOINT_INTERVAL;

// =============================================================================
// Engine defaults
// =============================================================================

/// Default compute platform when a job's config does not name one.
pub const DEFAULT_PLATFORM: &str = "auto";

/// Platforms accepted for `engine.default_platform`.
pub const VALID_PLATFORMS: &[&str] = &["auto", "cpu", "cuda", "opencl", "reference"];

// =============================================================================
// Logging defaults
// =============================================================================

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "simforge.log";

/// Default log level when RUST_LOG is not set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Levels accepted for `logging.level`.
pub const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

// =============================================================================
// Path helpers
// =============================================================================

/// Default job store root (~/.simforge/jobs).
pub fn default_store_directory() -> PathBuf {
    super::file::config_directory().join("jobs")
}

/// Default log directory (~/.simforge/logs).
pub fn default_log_directory() -> PathBuf {
    super::file::config_directory().join("logs")
}

// =============================================================================
// ConfigFile::default()
// =============================================================================

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            store: StoreSettings {
                directory: default_store_directory(),
            },
            executor: ExecutorSettings {
                max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
                chunk_size: DEFAULT_CHUNK_SIZE,
                checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            },
            engine: EngineSettings {
                default_platform: DEFAULT_PLATFORM.to_string(),
            },
            logging: LoggingSettings {
                directory: default_log_directory(),
                file: DEFAULT_LOG_FILE.to_string(),
                level: DEFAULT_LOG_LEVEL.to_string(),
            },
        }
    }
}
