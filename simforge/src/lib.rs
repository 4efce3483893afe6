//! SimForge - Orchestration for long-running scientific computation jobs
//!
//! This library provides durable, pausable execution of molecular dynamics
//! and electronic structure calculations: every job is a crash-safe record
//! on disk, concurrency is bounded by an execution gate, and running jobs
//! can be paused, resumed, and stopped at chunk boundaries.
//!
//! # High-Level API
//!
//! For most use cases, the [`orchestrator`] module provides the facade:
//!
//! ```ignore
//! use simforge::job::JobKind;
//! use simforge::orchestrator::{Orchestrator, OrchestratorConfig};
//!
//! let orchestrator = Orchestrator::open(OrchestratorConfig::default()).await?;
//!
//! // Create a molecular dynamics job and run it to completion
//! let id = orchestrator.create(JobKind::MolecularDynamics, params).await;
//! orchestrator.start(&id).await?;
//! let status = orchestrator.wait(&id).await?;
//! ```

pub mod config;
pub mod engine;
pub mod executor;
pub mod job;
pub mod logging;
pub mod orchestrator;
pub mod store;

/// Version of the SimForge library and CLI, injected from `Cargo.toml`
/// at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
