//! CLI runner for common setup.
//!
//! Encapsulates config loading, logging initialization, and orchestrator
//! construction to reduce duplication across command handlers.

use crate::error::CliError;
use simforge::config::ConfigFile;
use simforge::logging::{init_logging, LoggingGuard};
use simforge::orchestrator::{Orchestrator, OrchestratorConfig};
use std::path::Path;
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// With `config_path` the named file is loaded instead of the default
    /// `~/.simforge/config.ini`; a missing file yields the defaults either
    /// way.
    pub fn open(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };

        let logging_guard = init_logging(
            &config.logging.directory,
            &config.logging.file,
            &config.logging.level,
        )
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("SimForge v{}", simforge::VERSION);
        info!("SimForge CLI: {} command", command);
    }

    /// Open the orchestrator over the configured data directory.
    pub async fn open_orchestrator(&self) -> Result<Orchestrator, CliError> {
        let config = OrchestratorConfig::from_config_file(&self.config);
        Orchestrator::open(config).await.map_err(CliError::from)
    }
}
