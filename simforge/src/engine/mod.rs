//! Compute engines.
//!
//! Each job kind maps to one engine. Engines expose their work as bounded
//! chunks so the supervisor can pause, stop, and persist between chunks
//! without the engine knowing anything about job lifecycles.

mod electronic;
mod factory;
mod molecular;
mod null;
mod traits;
mod types;

pub use electronic::ElectronicStructureEngine;
pub use factory::{default_engines, EngineMap};
pub use molecular::MolecularDynamicsEngine;
pub use null::{NullCounters, NullEngine};
pub use traits::{ComputeEngine, EngineFuture, EngineRun};
pub use types::{CheckpointBlob, ChunkOutcome, EngineError, RunSpec, SetupError};
