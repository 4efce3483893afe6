//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Job store settings
    pub store: StoreSettings,
    /// Executor settings for concurrency and chunking
    pub executor: ExecutorSettings,
    /// Engine settings
    pub engine: EngineSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Job store configuration.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Root directory for job records and outputs.
    /// Default: ~/.simforge/jobs
    pub directory: PathBuf,
}

/// Executor configuration for concurrency and chunking.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Maximum jobs executing at once; further starts queue.
    /// A paused job still occupies a slot.
    /// Default: 2
    pub max_concurrent_jobs: usize,
    /// Work units advanced per chunk. Control signals are only observed
    /// between chunks, so this bounds pause/stop latency.
    /// Default: 1000
    pub chunk_size: u64,
    /// Work units between restart checkpoints. 0 disables checkpointing.
    /// Default: 10000
    pub checkpoint_interval: u64,
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Compute platform used when a job's config does not name one:
    /// "auto", "cpu", "cuda", "opencl", or "reference".
    /// Default: auto
    pub default_platform: String,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Directory for log files.
    /// Default: ~/.simforge/logs
    pub directory: PathBuf,
    /// Log file name within the logging directory.
    /// Default: simforge.log
    pub file: String,
    /// Default log level when RUST_LOG is not set:
    /// "trace", "debug", "info", "warn", or "error".
    /// Default: info
    pub level: String,
}
