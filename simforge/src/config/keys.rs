//! Configuration key access and validation.
//!
//! This module provides a type-safe interface for getting and setting
//! configuration values by key name, with validation via the Specification Pattern.

use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use super::defaults::{VALID_LOG_LEVELS, VALID_PLATFORMS};
use super::parser::expand_tilde;
use super::settings::ConfigFile;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
///
/// Each key maps to a specific field in [`ConfigFile`] and knows how to
/// get and set its value with proper validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    // Store settings
    StoreDirectory,

    // Executor settings
    ExecutorMaxConcurrentJobs,
    ExecutorChunkSize,
    ExecutorCheckpointInterval,

    // Engine settings
    EngineDefaultPlatform,

    // Logging settings
    LoggingDirectory,
    LoggingFile,
    LoggingLevel,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "store.directory" => Ok(ConfigKey::StoreDirectory),

            "executor.max_concurrent_jobs" => Ok(ConfigKey::ExecutorMaxConcurrentJobs),
            "executor.chunk_size" => Ok(ConfigKey::ExecutorChunkSize),
            "executor.checkpoint_interval" => Ok(ConfigKey::ExecutorCheckpointInterval),

            "engine.default_platform" => Ok(ConfigKey::EngineDefaultPlatform),

            "logging.directory" => Ok(ConfigKey::LoggingDirectory),
            "logging.file" => Ok(ConfigKey::LoggingFile),
            "logging.level" => Ok(ConfigKey::LoggingLevel),

            _ => Err(ConfigKeyError::UnknownKey(s.to_string())),
        }
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "executor.chunk_size").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::StoreDirectory => "store.directory",
            ConfigKey::ExecutorMaxConcurrentJobs => "executor.max_concurrent_jobs",
            ConfigKey::ExecutorChunkSize => "executor.chunk_size",
            ConfigKey::ExecutorCheckpointInterval => "executor.checkpoint_interval",
            ConfigKey::EngineDefaultPlatform => "engine.default_platform",
            ConfigKey::LoggingDirectory => "logging.directory",
            ConfigKey::LoggingFile => "logging.file",
            ConfigKey::LoggingLevel => "logging.level",
        }
    }

    /// Get the section name (e.g., "executor").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "chunk_size").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::StoreDirectory => path_to_display(&config.store.directory),
            ConfigKey::ExecutorMaxConcurrentJobs => {
                config.executor.max_concurrent_jobs.to_string()
            }
            ConfigKey::ExecutorChunkSize => config.executor.chunk_size.to_string(),
            ConfigKey::ExecutorCheckpointInterval => {
                config.executor.checkpoint_interval.to_string()
            }
            ConfigKey::EngineDefaultPlatform => config.engine.default_platform.clone(),
            ConfigKey::LoggingDirectory => path_to_display(&config.logging.directory),
            ConfigKey::LoggingFile => config.logging.file.clone(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
        }
    }

    /// Set the value in a config file.
    ///
    /// Validates the value according to the key's specification before setting.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        self.validate(value)?;
        self.set_unchecked(config, value);
        Ok(())
    }

    /// Set the value without validation. Use `set()` for validated setting.
    fn set_unchecked(&self, config: &mut ConfigFile, value: &str) {
        match self {
            ConfigKey::StoreDirectory => {
                config.store.directory = expand_tilde(value);
            }
            ConfigKey::ExecutorMaxConcurrentJobs => {
                // Validation ensures this won't panic
                config.executor.max_concurrent_jobs = value.parse().unwrap();
            }
            ConfigKey::ExecutorChunkSize => {
                config.executor.chunk_size = value.parse().unwrap();
            }
            ConfigKey::ExecutorCheckpointInterval => {
                config.executor.checkpoint_interval = value.parse().unwrap();
            }
            ConfigKey::EngineDefaultPlatform => {
                config.engine.default_platform = value.to_lowercase();
            }
            ConfigKey::LoggingDirectory => {
                config.logging.directory = expand_tilde(value);
            }
            ConfigKey::LoggingFile => {
                config.logging.file = value.to_string();
            }
            ConfigKey::LoggingLevel => {
                config.logging.level = value.to_lowercase();
            }
        }
    }

    /// Validate a value according to this key's specification.
    pub fn validate(&self, value: &str) -> Result<(), ConfigKeyError> {
        self.specification()
            .is_satisfied_by(value)
            .map_err(|reason| ConfigKeyError::ValidationFailed {
                key: self.name().to_string(),
                reason,
            })
    }

    /// Get the validation specification for this key.
    fn specification(&self) -> Box<dyn ValueSpecification> {
        match self {
            ConfigKey::StoreDirectory => Box::new(PathSpec),
            ConfigKey::ExecutorMaxConcurrentJobs => Box::new(PositiveIntegerSpec),
            ConfigKey::ExecutorChunkSize => Box::new(PositiveIntegerSpec),
            ConfigKey::ExecutorCheckpointInterval => Box::new(NonNegativeIntegerSpec),
            ConfigKey::EngineDefaultPlatform => Box::new(OneOfSpec::new(VALID_PLATFORMS)),
            ConfigKey::LoggingDirectory => Box::new(PathSpec),
            ConfigKey::LoggingFile => Box::new(PathSpec),
            ConfigKey::LoggingLevel => Box::new(OneOfSpec::new(VALID_LOG_LEVELS)),
        }
    }

    /// Get all supported configuration keys.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::StoreDirectory,
            ConfigKey::ExecutorMaxConcurrentJobs,
            ConfigKey::ExecutorChunkSize,
            ConfigKey::ExecutorCheckpointInterval,
            ConfigKey::EngineDefaultPlatform,
            ConfigKey::LoggingDirectory,
            ConfigKey::LoggingFile,
            ConfigKey::LoggingLevel,
        ]
    }
}

// ============================================================================
// Value Specifications (Specification Pattern)
// ============================================================================

/// Trait for value validation specifications.
trait ValueSpecification {
    /// Check if the value satisfies this specification.
    /// Returns Ok(()) if valid, Err(reason) if invalid.
    fn is_satisfied_by(&self, value: &str) -> Result<(), String>;
}

/// Specification that requires the value to be one of a set of options.
struct OneOfSpec {
    options: &'static [&'static str],
}

impl OneOfSpec {
    fn new(options: &'static [&'static str]) -> Self {
        Self { options }
    }
}

impl ValueSpecification for OneOfSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let lower = value.to_lowercase();
        if self.options.iter().any(|opt| *opt == lower) {
            Ok(())
        } else {
            Err(format!("must be one of: {}", self.options.join(", ")))
        }
    }
}

/// Specification for integer values that must be at least 1.
struct PositiveIntegerSpec;

impl ValueSpecification for PositiveIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        match value.parse::<u64>() {
            Ok(n) if n > 0 => Ok(()),
            _ => Err("must be an integer greater than zero".to_string()),
        }
    }
}

/// Specification for integer values where zero is meaningful.
struct NonNegativeIntegerSpec;

impl ValueSpecification for NonNegativeIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        value
            .parse::<u64>()
            .map(|_| ())
            .map_err(|_| "must be a non-negative integer".to_string())
    }
}

/// Specification for path values (non-empty).
struct PathSpec;

impl ValueSpecification for PathSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            Err("must be a non-empty path".to_string())
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert path to display string, collapsing home dir to ~.
fn path_to_display(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
