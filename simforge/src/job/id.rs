//! Job identifier newtype.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a job.
///
/// Job IDs are opaque strings. Freshly created jobs receive a random UUID,
/// but any string loaded from the store is accepted so records written by
/// earlier runs keep their identity.
///
/// # Example
///
/// ```ignore
/// use simforge::job::JobId;
///
/// // Auto-generated unique ID
/// let id = JobId::generate();
///
/// // ID from an existing record
/// let id = JobId::new("3f2a9c1e-5b7d-4e8f-9a0b-1c2d3e4f5a6b");
/// ```
#[derive(Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Creates a job ID with the given string value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates a unique random job ID (UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the string value of this job ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JobId({})", self.0)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
