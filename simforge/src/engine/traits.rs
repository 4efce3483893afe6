//! Compute engine traits.
//!
//! The orchestrator never knows what a job computes. It talks to engines
//! through two object-safe traits: [`ComputeEngine`] turns a job's config
//! into a prepared [`EngineRun`], and the run exposes its work as bounded
//! chunks the supervisor drives one at a time.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 Execution Supervisor                     │
//! │                                                          │
//! │   prepare ─▶ warm_up ─▶ run_chunk ··· run_chunk ─▶       │
//! │                         checkpoint      collect_results  │
//! └──────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │              ComputeEngine / EngineRun                   │
//! │                                                          │
//! │   MolecularDynamicsEngine   (md:  steps of dynamics)     │
//! │   ElectronicStructureEngine (dft: SCF iterations)        │
//! │   NullEngine                (tests)                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Chunk boundaries are the cooperation points: between chunks the
//! supervisor applies pause/stop signals and persists progress, so the
//! stop latency of a job is bounded by its chunk size.

use super::types::{CheckpointBlob, ChunkOutcome, EngineError, RunSpec, SetupError};
use crate::job::JobKind;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by engine trait methods.
pub type EngineFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A family of computations (one per [`JobKind`]).
///
/// Engines are stateless and shared; all per-run state lives in the
/// [`EngineRun`] returned by `prepare`.
pub trait ComputeEngine: Send + Sync {
    /// The job kind this engine executes.
    fn kind(&self) -> JobKind;

    /// Short engine name for logging.
    fn name(&self) -> &str;

    /// Validates the config and builds a ready-to-run instance.
    ///
    /// No work units execute here; expensive state setup belongs in
    /// [`EngineRun::warm_up`]. Errors here fail the job before it ever
    /// reaches `running`.
    fn prepare<'a>(
        &'a self,
        spec: &'a RunSpec,
    ) -> EngineFuture<'a, Result<Box<dyn EngineRun>, SetupError>>;
}

/// One prepared run, driven chunk by chunk.
///
/// The supervisor owns the run exclusively; methods take `&mut self` and
/// are never called concurrently.
pub trait EngineRun: Send {
    /// Total work units this run plans to execute. Known after `prepare`.
    fn total_units(&self) -> u64;

    /// Label of the phase the run is currently in (e.g. "minimization",
    /// "dynamics", "scf").
    fn phase(&self) -> &str;

    /// Preparatory pass before the first chunk (e.g. energy
    /// minimization). Runs while the job is still `initializing` and
    /// does not count against work units.
    fn warm_up(&mut self) -> EngineFuture<'_, Result<(), EngineError>> {
        Box::pin(async { Ok(()) })
    }

    /// Executes up to `max_units` units of work.
    fn run_chunk(&mut self, max_units: u64) -> EngineFuture<'_, Result<ChunkOutcome, EngineError>>;

    /// Produces a restart checkpoint, if this engine supports them.
    ///
    /// The supervisor writes the returned blob into the job's outputs
    /// directory. Engines without checkpoints return `None`.
    fn checkpoint(&mut self) -> EngineFuture<'_, Result<Option<CheckpointBlob>, EngineError>> {
        Box::pin(async { Ok(None) })
    }

    /// Assembles the final result payload once the run is exhausted.
    fn collect_results(&mut self) -> EngineFuture<'_, Result<serde_json::Value, EngineError>>;

    /// Frees engine-side state. Called exactly once on every exit path,
    /// whether the run completed, faulted, or was stopped.
    fn release(&mut self) -> EngineFuture<'_, ()> {
        Box::pin(async {})
    }
}
