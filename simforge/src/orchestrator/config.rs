//! Orchestrator configuration.

use crate::config::{
    default_store_directory, ConfigFile, DEFAULT_MAX_CONCURRENT_JOBS, DEFAULT_PLATFORM,
};
use crate::executor::{DEFAULT_CHECKPOINT_INTERVAL, DEFAULT_CHUNK_SIZE};
use std::path::PathBuf;

/// Runtime configuration for [`Orchestrator::open`].
///
/// Usually built from the user's config file; tests override individual
/// fields through the `with_` builders.
///
/// # Example
///
/// ```ignore
/// use simforge::orchestrator::{Orchestrator, OrchestratorConfig};
///
/// let config = OrchestratorConfig::from_config_file(&config_file);
/// let orchestrator = Orchestrator::open(config).await?;
/// ```
///
/// [`Orchestrator::open`]: super::Orchestrator::open
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Root directory for durable job records and outputs.
    pub data_dir: PathBuf,

    /// How many jobs may execute simultaneously. Must be at least 1.
    pub max_concurrent_jobs: usize,

    /// Work units per chunk between control-signal checks. Must be at
    /// least 1.
    pub chunk_size: u64,

    /// Work units between checkpoints. 0 disables checkpoints.
    pub checkpoint_interval: u64,

    /// Platform handed to engines when a job's config names none.
    pub default_platform: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            data_dir: default_store_directory(),
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            default_platform: DEFAULT_PLATFORM.to_string(),
        }
    }
}

impl OrchestratorConfig {
    /// Extracts the orchestrator's settings from a loaded config file.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        Self {
            data_dir: config.store.directory.clone(),
            max_concurrent_jobs: config.executor.max_concurrent_jobs,
            chunk_size: config.executor.chunk_size,
            checkpoint_interval: config.executor.checkpoint_interval,
            default_platform: config.engine.default_platform.clone(),
        }
    }

    /// Sets the data directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Sets the concurrent-job cap.
    pub fn with_max_concurrent_jobs(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max;
        self
    }

    /// Sets the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the checkpoint interval.
    pub fn with_checkpoint_interval(mut self, interval: u64) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    /// Sets the default compute platform.
    pub fn with_default_platform(mut self, platform: impl Into<String>) -> Self {
        self.default_platform = platform.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_config_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.max_concurrent_jobs, DEFAULT_MAX_CONCURRENT_JOBS);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.checkpoint_interval, DEFAULT_CHECKPOINT_INTERVAL);
        assert_eq!(config.default_platform, DEFAULT_PLATFORM);
        assert!(config.data_dir.ends_with("jobs"));
    }

    #[test]
    fn test_from_config_file_extracts_every_field() {
        let mut file = ConfigFile::default();
        file.store.directory = PathBuf::from("/data/simforge/jobs");
        file.executor.max_concurrent_jobs = 4;
        file.executor.chunk_size = 250;
        file.executor.checkpoint_interval = 0;
        file.engine.default_platform = "cuda".to_string();

        let config = OrchestratorConfig::from_config_file(&file);
        assert_eq!(config.data_dir, PathBuf::from("/data/simforge/jobs"));
        assert_eq!(config.max_concurrent_jobs, 4);
        assert_eq!(config.chunk_size, 250);
        assert_eq!(config.checkpoint_interval, 0);
        assert_eq!(config.default_platform, "cuda");
    }

    #[test]
    fn test_builders() {
        let config = OrchestratorConfig::default()
            .with_data_dir("/tmp/jobs")
            .with_max_concurrent_jobs(1)
            .with_chunk_size(5)
            .with_checkpoint_interval(50)
            .with_default_platform("cpu");

        assert_eq!(config.data_dir, PathBuf::from("/tmp/jobs"));
        assert_eq!(config.max_concurrent_jobs, 1);
        assert_eq!(config.chunk_size, 5);
        assert_eq!(config.checkpoint_interval, 50);
        assert_eq!(config.default_platform, "cpu");
    }
}
