//! Store error types.

use crate::job::JobId;
use std::path::PathBuf;
use thiserror::Error;

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O failure while touching the data directory
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded for writing
    #[error("Failed to encode job record: {0}")]
    Encode(#[source] serde_json::Error),

    /// On-disk record exists but does not parse
    #[error("Corrupt job record at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No record stored under this id
    #[error("No stored job with id {0}")]
    NotFound(JobId),
}
