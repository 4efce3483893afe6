//! Job data model.
//!
//! A job is one long-running computation with a durable record: identity,
//! kind, opaque engine config, lifecycle status, progress counters, and the
//! final result or error. The record is the unit of persistence; everything
//! the orchestrator knows about a job survives a process restart through it.

mod id;
mod kind;
mod progress;
mod record;
mod status;

pub use id::JobId;
pub use kind::{JobKind, UnknownJobKind};
pub use progress::JobProgress;
pub use record::{JobRecord, JobSummary};
pub use status::JobStatus;
