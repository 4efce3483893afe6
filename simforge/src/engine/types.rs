//! Engine-facing types: run specification, chunk outcomes, and errors.

use crate::job::JobId;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Run Specification
// ============================================================================

/// Everything an engine needs to set up one run.
///
/// Built by the supervisor from the job record; the config map is the
/// caller-supplied parameter set, already path-sanitized, and stays opaque
/// to everything outside the engine.
#[derive(Debug, Clone)]
pub struct RunSpec {
    /// The job this run belongs to.
    pub job_id: JobId,
    /// Engine-specific parameters from the job record.
    pub config: serde_json::Map<String, Value>,
    /// Directory all artifacts must be written into. Exists before
    /// `prepare` is called.
    pub outputs_dir: PathBuf,
    /// Platform to use when the config does not name one.
    pub default_platform: String,
}

/// Result of executing one bounded chunk of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkOutcome {
    /// Units actually completed in this chunk. May be less than asked
    /// when the run finishes or converges mid-chunk.
    pub units_completed: u64,
    /// True once no further work remains.
    pub exhausted: bool,
}

/// Opaque checkpoint payload handed back to the supervisor, which writes
/// it into the job's outputs directory under `file_name`.
#[derive(Debug, Clone)]
pub struct CheckpointBlob {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

// ============================================================================
// Engine Errors
// ============================================================================

/// Errors raised while setting a run up. A setup error fails the job
/// before any work units execute.
#[derive(Debug, Clone, Error)]
pub enum SetupError {
    /// A config value is missing, has the wrong type, or is out of range.
    #[error("invalid config value for {key:?}: {reason}")]
    InvalidConfig { key: String, reason: String },

    /// A required input file or resource is absent.
    #[error("missing input: {0}")]
    MissingInput(String),

    /// The requested compute platform is not available.
    #[error("compute platform {0:?} is not available")]
    PlatformUnavailable(String),

    /// Filesystem failure while laying out the run.
    #[error("setup I/O failure: {0}")]
    Io(String),
}

impl SetupError {
    /// Creates an invalid-config error for a specific key.
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for SetupError {
    fn from(e: std::io::Error) -> Self {
        SetupError::Io(e.to_string())
    }
}

/// Errors raised while a prepared run is executing. An engine error fails
/// the job; progress made before the fault is retained in the record.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// A chunk of computation faulted.
    #[error("chunk fault: {0}")]
    Chunk(String),

    /// Producing a checkpoint faulted.
    #[error("checkpoint fault: {0}")]
    Checkpoint(String),

    /// Assembling the final results faulted.
    #[error("result fault: {0}")]
    Results(String),

    /// Filesystem failure while writing artifacts.
    #[error("engine I/O failure: {0}")]
    Io(String),
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e.to_string())
    }
}

// ============================================================================
// Config Access Helpers
// ============================================================================

/// Reads an optional unsigned integer key.
pub(crate) fn u64_key(
    config: &serde_json::Map<String, Value>,
    key: &str,
    default: u64,
) -> Result<u64, SetupError> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_u64()
            .ok_or_else(|| SetupError::invalid(key, "expected a non-negative integer")),
    }
}

/// Reads a required unsigned integer key.
pub(crate) fn required_u64(
    config: &serde_json::Map<String, Value>,
    key: &str,
) -> Result<u64, SetupError> {
    match config.get(key) {
        None | Some(Value::Null) => Err(SetupError::invalid(key, "required value is missing")),
        Some(value) => value
            .as_u64()
            .ok_or_else(|| SetupError::invalid(key, "expected a non-negative integer")),
    }
}

/// Reads an optional float key. Integer JSON values are accepted.
pub(crate) fn f64_key(
    config: &serde_json::Map<String, Value>,
    key: &str,
    default: f64,
) -> Result<f64, SetupError> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_f64()
            .ok_or_else(|| SetupError::invalid(key, "expected a number")),
    }
}

/// Reads an optional boolean key.
pub(crate) fn bool_key(
    config: &serde_json::Map<String, Value>,
    key: &str,
    default: bool,
) -> Result<bool, SetupError> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => value
            .as_bool()
            .ok_or_else(|| SetupError::invalid(key, "expected true or false")),
    }
}

/// Reads an optional string key.
pub(crate) fn str_key(
    config: &serde_json::Map<String, Value>,
    key: &str,
    default: &str,
) -> Result<String, SetupError> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(value) => value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SetupError::invalid(key, "expected a string")),
    }
}
