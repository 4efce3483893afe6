//! Execution handle and control signals.
//!
//! When a job starts, the orchestrator keeps an [`ExecutionHandle`] wired
//! to the spawned supervisor: a watch channel broadcasting every status
//! transition, and a signal channel carrying cooperative control requests.
//! The handle's presence in the registry is also what guarantees a job
//! never has two live supervisors.

use crate::job::{JobId, JobStatus};
use std::fmt;
use tokio::sync::{mpsc, watch};

/// Cooperative control requests applied at chunk boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Freeze after the current chunk, keeping engine state resident.
    Pause,
    /// Continue a paused job.
    Resume,
    /// Unwind the run and finalize as stopped.
    Stop,
}

impl fmt::Display for ControlSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlSignal::Pause => write!(f, "pause"),
            ControlSignal::Resume => write!(f, "resume"),
            ControlSignal::Stop => write!(f, "stop"),
        }
    }
}

/// Capacity of the per-job signal channel. Signals are drained at every
/// chunk boundary, so a small buffer is plenty.
pub(crate) const SIGNAL_CHANNEL_CAPACITY: usize = 16;

/// Live connection to one job's supervisor.
///
/// Clone-cheap; all clones observe the same run.
#[derive(Clone)]
pub struct ExecutionHandle {
    job_id: JobId,
    status_rx: watch::Receiver<JobStatus>,
    signal_tx: mpsc::Sender<ControlSignal>,
}

impl ExecutionHandle {
    pub(crate) fn new(
        job_id: JobId,
        status_rx: watch::Receiver<JobStatus>,
        signal_tx: mpsc::Sender<ControlSignal>,
    ) -> Self {
        Self {
            job_id,
            status_rx,
            signal_tx,
        }
    }

    /// The job this handle controls.
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Latest status broadcast by the supervisor.
    pub fn status(&self) -> JobStatus {
        *self.status_rx.borrow()
    }

    /// Waits until the run reaches a terminal status and returns it.
    ///
    /// Also returns if the supervisor goes away entirely; the last
    /// observed status is returned in that case.
    pub async fn wait(&mut self) -> JobStatus {
        loop {
            let status = self.status();
            if status.is_terminal() {
                return status;
            }
            if self.status_rx.changed().await.is_err() {
                return self.status();
            }
        }
    }

    /// Sends a control signal to the supervisor.
    ///
    /// Returns false if the supervisor is no longer listening.
    pub fn signal(&self, signal: ControlSignal) -> bool {
        self.signal_tx.try_send(signal).is_ok()
    }

    /// Requests a pause at the next chunk boundary.
    pub fn pause(&self) -> bool {
        self.signal(ControlSignal::Pause)
    }

    /// Requests that a paused job continue.
    pub fn resume(&self) -> bool {
        self.signal(ControlSignal::Resume)
    }

    /// Requests a cooperative stop.
    pub fn stop(&self) -> bool {
        self.signal(ControlSignal::Stop)
    }
}

impl fmt::Debug for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionHandle")
            .field("job_id", &self.job_id)
            .field("status", &self.status())
            .finish()
    }
}
