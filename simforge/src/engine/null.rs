//! Null compute engine for tests.
//!
//! Runs complete without doing any real work, with optional injected
//! faults and per-chunk delays. Shared atomic counters let tests assert
//! how many runs were prepared, released, and concurrently in flight.

use super::traits::{ComputeEngine, EngineFuture, EngineRun};
use super::types::{ChunkOutcome, EngineError, RunSpec, SetupError};
use crate::job::JobKind;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counters shared between a [`NullEngine`] and every run it prepares.
#[derive(Debug, Default)]
pub struct NullCounters {
    prepared_runs: AtomicUsize,
    released_runs: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl NullCounters {
    /// Runs prepared so far.
    pub fn prepared_runs(&self) -> usize {
        self.prepared_runs.load(Ordering::SeqCst)
    }

    /// Runs released so far.
    pub fn released_runs(&self) -> usize {
        self.released_runs.load(Ordering::SeqCst)
    }

    /// Runs currently between prepare and release.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest concurrent in-flight count observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        self.prepared_runs.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let mut peak = self.peak_in_flight.load(Ordering::SeqCst);
        while current > peak {
            match self.peak_in_flight.compare_exchange_weak(
                peak,
                current,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => break,
                Err(observed) => peak = observed,
            }
        }
    }

    fn exit(&self) {
        self.released_runs.fetch_add(1, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// No-op engine with configurable shape and injected faults.
pub struct NullEngine {
    kind: JobKind,
    total_units: u64,
    chunk_delay: Option<Duration>,
    prepare_fault: Option<String>,
    chunk_fault_after: Option<u64>,
    counters: Arc<NullCounters>,
}

impl NullEngine {
    /// Creates a null engine serving the given job kind, with 10 work
    /// units and no faults.
    pub fn new(kind: JobKind) -> Self {
        Self {
            kind,
            total_units: 10,
            chunk_delay: None,
            prepare_fault: None,
            chunk_fault_after: None,
            counters: Arc::new(NullCounters::default()),
        }
    }

    /// Sets how many work units a run reports and executes.
    pub fn with_total_units(mut self, units: u64) -> Self {
        self.total_units = units;
        self
    }

    /// Makes every chunk sleep before completing, so tests can observe
    /// jobs mid-run.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    /// Makes `prepare` fail with the given message.
    pub fn with_prepare_fault(mut self, message: impl Into<String>) -> Self {
        self.prepare_fault = Some(message.into());
        self
    }

    /// Makes the chunk after `units` completed units fail.
    pub fn with_chunk_fault_after(mut self, units: u64) -> Self {
        self.chunk_fault_after = Some(units);
        self
    }

    /// Shared counters for assertions.
    pub fn counters(&self) -> Arc<NullCounters> {
        Arc::clone(&self.counters)
    }
}

impl ComputeEngine for NullEngine {
    fn kind(&self) -> JobKind {
        self.kind
    }

    fn name(&self) -> &str {
        "null"
    }

    fn prepare<'a>(
        &'a self,
        _spec: &'a RunSpec,
    ) -> EngineFuture<'a, Result<Box<dyn EngineRun>, SetupError>> {
        Box::pin(async move {
            if let Some(message) = &self.prepare_fault {
                return Err(SetupError::MissingInput(message.clone()));
            }
            self.counters.enter();
            Ok(Box::new(NullRun {
                total_units: self.total_units,
                completed: 0,
                chunk_delay: self.chunk_delay,
                chunk_fault_after: self.chunk_fault_after,
                counters: Arc::clone(&self.counters),
                released: false,
            }) as Box<dyn EngineRun>)
        })
    }
}

struct NullRun {
    total_units: u64,
    completed: u64,
    chunk_delay: Option<Duration>,
    chunk_fault_after: Option<u64>,
    counters: Arc<NullCounters>,
    released: bool,
}

impl EngineRun for NullRun {
    fn total_units(&self) -> u64 {
        self.total_units
    }

    fn phase(&self) -> &str {
        "noop"
    }

    fn run_chunk(&mut self, max_units: u64) -> EngineFuture<'_, Result<ChunkOutcome, EngineError>> {
        Box::pin(async move {
            if let Some(delay) = self.chunk_delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(fault_at) = self.chunk_fault_after {
                if self.completed >= fault_at {
                    return Err(EngineError::Chunk(format!(
                        "injected fault after {} units",
                        self.completed
                    )));
                }
            }
            let units = self.total_units.saturating_sub(self.completed).min(max_units);
            self.completed += units;
            Ok(ChunkOutcome {
                units_completed: units,
                exhausted: self.completed >= self.total_units,
            })
        })
    }

    fn collect_results(&mut self) -> EngineFuture<'_, Result<serde_json::Value, EngineError>> {
        Box::pin(async move {
            Ok(json!({
                "engine": "null",
                "units_completed": self.completed,
            }))
        })
    }

    fn release(&mut self) -> EngineFuture<'_, ()> {
        Box::pin(async move {
            if !self.released {
                self.released = true;
                self.counters.exit();
            }
        })
    }
}
