//! Orchestrator error taxonomy and control actions.

use crate::job::{JobId, JobKind, JobStatus};
use crate::store::StoreError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The lifecycle actions callers can apply to a job.
///
/// `control` dispatches on this; the variants also name the rejected
/// action inside [`OrchestratorError::InvalidTransition`] so error
/// messages read naturally ("cannot pause job ... while pending").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Start,
    Pause,
    Resume,
    Stop,
    Delete,
}

impl ControlAction {
    /// Returns the lowercase wire name for this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlAction::Start => "start",
            ControlAction::Pause => "pause",
            ControlAction::Resume => "resume",
            ControlAction::Stop => "stop",
            ControlAction::Delete => "delete",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a control action string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown control action: {0:?} (expected start, pause, resume, stop, or delete)")]
pub struct UnknownControlAction(pub String);

impl FromStr for ControlAction {
    type Err = UnknownControlAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(ControlAction::Start),
            "pause" => Ok(ControlAction::Pause),
            "resume" => Ok(ControlAction::Resume),
            "stop" => Ok(ControlAction::Stop),
            "delete" => Ok(ControlAction::Delete),
            other => Err(UnknownControlAction(other.to_string())),
        }
    }
}

/// Errors surfaced by the orchestrator façade.
///
/// These are all caller-facing validation and persistence failures.
/// Faults inside a running engine never appear here; the supervisor
/// captures them into the job record's `error` field and the job
/// finalizes as `failed`.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No job with this id is registered.
    #[error("unknown job: {0}")]
    UnknownJob(JobId),

    /// The requested action is not valid in the job's current status.
    /// The record is left unchanged.
    #[error("cannot {action} job {id} while {status}")]
    InvalidTransition {
        id: JobId,
        action: ControlAction,
        status: JobStatus,
    },

    /// Results were requested before the job completed.
    #[error("results for job {id} are not ready: job is {status}")]
    ResultsNotReady { id: JobId, status: JobStatus },

    /// No engine is wired for the job's kind.
    #[error("no engine available for {0} jobs")]
    EngineUnavailable(JobKind),

    /// The durable store failed in a way that blocks the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}
