//! Bounded-concurrency job execution.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Orchestrator                         │
//! │  validate transitions, spawn supervisors, expose handles │
//! ├──────────────────────────────────────────────────────────┤
//! │                 Supervisor (one task/job)                │
//! │  admission → prepare → chunk loop → finalize             │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌──────────────┐  ┌────────────────┐   │
//! │  │ Execution   │  │ Job          │  │ Execution      │   │
//! │  │ Gate        │  │ Registry     │  │ Handle         │   │
//! │  └─────────────┘  └──────────────┘  └────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Core Concepts
//!
//! - **Gate**: Semaphore-based cap on concurrently executing jobs.
//!   A permit is held from admission to finalization, including while
//!   paused.
//!
//! - **Registry**: Shared in-memory map of every job record plus the
//!   live execution handle for jobs with a running supervisor.
//!
//! - **Supervisor**: The per-job task that owns the engine run and all
//!   status transitions, persisting each one through the store.
//!
//! - **Handle**: Channel pair for one run. Watch side broadcasts status
//!   transitions; signal side carries pause/resume/stop requests that
//!   take effect at chunk boundaries.

mod config;
mod gate;
mod handle;
mod registry;
mod supervisor;

// Gate
pub use gate::{ExecutionGate, GatePermit};

// Control surface
pub use handle::{ControlSignal, ExecutionHandle};

// Registry
pub use registry::{JobEntry, JobRegistry};

// Supervisor configuration
pub use config::{SupervisorConfig, DEFAULT_CHECKPOINT_INTERVAL, DEFAULT_CHUNK_SIZE};

pub(crate) use handle::SIGNAL_CHANNEL_CAPACITY;
pub(crate) use supervisor::{spawn_supervisor, SupervisorContext};
