//! Job lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current status of a job in its lifecycle.
///
/// The allowed transitions form a small state machine:
///
/// ```text
///                    start                      exhausted
///   pending ────────────────▶ initializing ─┐  ┌──────────▶ completed
///      ▲                           │        │  │
///      │ (new record)              ▼        │  │  fault
///                               running ────┼──┼──────────▶ failed
///                              ▲      │     │  │
///                       resume │      │ pause  │
///                              │      ▼     │  │
///                               paused ─────┤  │
///                                           ▼  │
///                          stop ──────▶ stopping ─▶ stopped
///
///   running / initializing / stopping found on disk at startup ─▶ interrupted
/// ```
///
/// `completed` and `failed` are terminal forever. `stopped` and
/// `interrupted` are terminal for the current run but accept a fresh
/// `start`, which re-initializes the job from its config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created and durable, never started.
    Pending,
    /// Admitted past the concurrency gate; engine state being prepared.
    Initializing,
    /// Actively executing chunks of work.
    Running,
    /// Frozen at a chunk boundary; engine state stays resident.
    Paused,
    /// Stop requested; the supervisor is unwinding.
    Stopping,
    /// Stopped on request. Eligible for restart.
    Stopped,
    /// All work finished; the record carries a result.
    Completed,
    /// A setup or engine fault ended the run; the record carries an error.
    Failed,
    /// Found mid-execution on disk after a process restart. Eligible for restart.
    Interrupted,
}

impl JobStatus {
    /// Returns true if the job has reached a terminal status for this run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Stopped | JobStatus::Completed | JobStatus::Failed | JobStatus::Interrupted
        )
    }

    /// Returns true if a supervisor currently owns this job.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            JobStatus::Initializing | JobStatus::Running | JobStatus::Paused | JobStatus::Stopping
        )
    }

    /// Returns true if `start` is a valid transition from this status.
    pub fn can_start(&self) -> bool {
        matches!(
            self,
            JobStatus::Pending | JobStatus::Interrupted | JobStatus::Stopped
        )
    }

    /// Returns true if the job is paused.
    pub fn is_paused(&self) -> bool {
        matches!(self, JobStatus::Paused)
    }

    /// Returns the lowercase wire name for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Initializing => "initializing",
            JobStatus::Running => "running",
            JobStatus::Paused => "paused",
            JobStatus::Stopping => "stopping",
            JobStatus::Stopped => "stopped",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
