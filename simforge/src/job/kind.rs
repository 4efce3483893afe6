//! Job kind tag.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The family of computation a job runs.
///
/// The kind selects which compute engine executes the job; the engine-specific
/// parameters live in the job's opaque config map. Serialized with the short
/// wire names (`"md"`, `"dft"`) used in job records.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    /// Molecular dynamics simulation.
    #[serde(rename = "md")]
    MolecularDynamics,
    /// Electronic structure (DFT) calculation.
    #[serde(rename = "dft")]
    ElectronicStructure,
}

impl JobKind {
    /// Returns the short wire name for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::MolecularDynamics => "md",
            JobKind::ElectronicStructure => "dft",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a job kind string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown job kind: {0:?} (expected \"md\" or \"dft\")")]
pub struct UnknownJobKind(pub String);

impl FromStr for JobKind {
    type Err = UnknownJobKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "md" => Ok(JobKind::MolecularDynamics),
            "dft" => Ok(JobKind::ElectronicStructure),
            other => Err(UnknownJobKind(other.to_string())),
        }
    }
}
