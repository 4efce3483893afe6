//! Bounded-concurrency admission gate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Caps how many jobs execute simultaneously.
///
/// A supervisor may not touch its engine until it holds a [`GatePermit`].
/// Waiters are admitted in request order, and a permit is released exactly
/// once, when it drops, on whatever path the supervisor exits by. Pausing
/// a job does not release its permit; paused engine state stays resident.
///
/// # Example
///
/// ```ignore
/// use simforge::executor::ExecutionGate;
///
/// let gate = ExecutionGate::new(2);
/// let permit = gate.acquire().await;
/// // ... run the job ...
/// drop(permit); // slot freed
/// ```
pub struct ExecutionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl ExecutionGate {
    /// Creates a gate admitting at most `capacity` jobs at once.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "gate capacity must be greater than zero");
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Waits for a slot, suspending until one frees.
    pub async fn acquire(&self) -> GatePermit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("gate semaphore closed unexpectedly");

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.update_peak();

        GatePermit {
            _permit: permit,
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Takes a slot only if one is free right now.
    pub fn try_acquire(&self) -> Option<GatePermit> {
        match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => {
                self.in_flight.fetch_add(1, Ordering::SeqCst);
                self.update_peak();
                Some(GatePermit {
                    _permit: permit,
                    in_flight: Arc::clone(&self.in_flight),
                })
            }
            Err(_) => None,
        }
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots free right now.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Permits currently held.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of permits ever held at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Resets the peak tracker to the current in-flight count.
    pub fn reset_peak(&self) {
        self.peak_in_flight.store(self.in_flight(), Ordering::SeqCst);
    }

    fn update_peak(&self) {
        let current = self.in_flight.load(Ordering::SeqCst);
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
}

impl std::fmt::Debug for ExecutionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionGate")
            .field("capacity", &self.capacity)
            .field("available", &self.available())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// A held execution slot. Dropping it frees the slot.
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    in_flight: Arc<AtomicUsize>,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
