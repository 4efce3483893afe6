//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use simforge::config::ConfigFileError;
use simforge::orchestrator::OrchestratorError;
use std::fmt;
use std::process;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to read a job config file
    JobConfigRead { path: String, error: std::io::Error },
    /// Job config file is not valid JSON
    JobConfigParse { path: String, error: serde_json::Error },
    /// A followed job finished as failed
    JobFailed { id: String, error: String },
    /// The orchestrator rejected the operation
    Orchestrator(OrchestratorError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Orchestrator(OrchestratorError::UnknownJob(_)) => {
                eprintln!();
                eprintln!("Use 'simforge list' to see known job IDs.");
            }
            CliError::Orchestrator(OrchestratorError::ResultsNotReady { id, .. }) => {
                eprintln!();
                eprintln!("Watch it with: simforge status {}", id);
            }
            CliError::JobFailed { id, .. } => {
                eprintln!();
                eprintln!("Inspect the record with: simforge status {}", id);
            }
            CliError::LoggingInit(_) => {
                eprintln!();
                eprintln!("Check the log directory setting:");
                eprintln!("  simforge config get logging.directory");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::JobConfigRead { path, error } => {
                write!(f, "Failed to read job config '{}': {}", path, error)
            }
            CliError::JobConfigParse { path, error } => {
                write!(f, "Invalid JSON in job config '{}': {}", path, error)
            }
            CliError::JobFailed { id, error } => write!(f, "Job {} failed: {}", id, error),
            CliError::Orchestrator(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::JobConfigRead { error, .. } => Some(error),
            CliError::JobConfigParse { error, .. } => Some(error),
            CliError::Orchestrator(e) => Some(e),
            _ => None,
        }
    }
}

impl From<OrchestratorError> for CliError {
    fn from(e: OrchestratorError) -> Self {
        CliError::Orchestrator(e)
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}
