//! Persistence health tracking.
//!
//! Record writes are best-effort: a failed save is logged, counted here,
//! and the in-memory record stays authoritative. This module keeps the
//! write-health signal that `Orchestrator::health` exposes so operators
//! can tell when job state is at risk of being lost on restart.

use crate::store::types::StoreError;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{info, warn};

/// Shared write-health state, updated by supervisors and read by the
/// orchestrator. Designed to be shared via `Arc`.
#[derive(Debug, Default)]
pub struct StoreHealth {
    /// True while the most recent record write failed.
    degraded: AtomicBool,

    /// Total failed record writes since startup.
    failed_writes: AtomicU64,

    /// Message of the most recent write failure, kept after recovery.
    last_error: Mutex<Option<String>>,
}

impl StoreHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed record write and marks persistence degraded.
    pub fn record_write_failure(&self, error: &StoreError) {
        self.failed_writes.fetch_add(1, Ordering::Relaxed);
        let message = error.to_string();
        if let Ok(mut last) = self.last_error.lock() {
            *last = Some(message.clone());
        }
        if !self.degraded.swap(true, Ordering::AcqRel) {
            warn!(error = %message, "Job store writes degraded");
        }
    }

    /// Records a successful record write, clearing the degraded flag.
    pub fn record_write_success(&self) {
        if self.degraded.swap(false, Ordering::AcqRel) {
            info!("Job store writes recovered");
        }
    }

    /// Returns true while the most recent record write failed.
    #[inline]
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Total failed record writes since startup.
    #[inline]
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }

    /// Snapshot of the current write-health state.
    pub fn report(&self) -> HealthReport {
        let last_error = self
            .last_error
            .lock()
            .map(|last| last.clone())
            .unwrap_or(None);
        HealthReport {
            degraded: self.is_degraded(),
            failed_writes: self.failed_writes(),
            last_error,
        }
    }
}

/// Point-in-time view of persistence health.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    /// True while the most recent record write failed.
    pub degraded: bool,
    /// Total failed record writes since startup.
    pub failed_writes: u64,
    /// Most recent write failure message, if any write has ever failed.
    pub last_error: Option<String>,
}
