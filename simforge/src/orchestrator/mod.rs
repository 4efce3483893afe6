//! Job lifecycle orchestration.
//!
//! The [`Orchestrator`] is the crate's front door. It owns the durable
//! store, the in-memory registry, the execution gate, and the engine map,
//! and it exposes the lifecycle operations (create, start, pause, resume,
//! stop, delete) plus the read side (status, progress, results, list,
//! wait). Engine faults never escape as errors here; they finalize the
//! job as `failed` and surface through its record.

mod config;
mod core;
mod error;

pub use self::core::Orchestrator;
pub use config::OrchestratorConfig;
pub use error::{ControlAction, OrchestratorError, UnknownControlAction};
