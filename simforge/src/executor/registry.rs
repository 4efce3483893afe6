//! In-memory job registry.
//!
//! The registry is the authoritative view of every job the orchestrator
//! knows about. Records are loaded from the store at startup and kept
//! current here; the store is written behind this map, and a persistence
//! failure never rolls back what the registry holds.
//!
//! Each entry optionally carries an [`ExecutionHandle`]: attached while a
//! supervisor task is alive for the job, detached when it exits. Attach
//! goes through the same lock as the status check that precedes it, which
//! is what makes "at most one supervisor per job" hold under concurrent
//! start calls.

use crate::executor::handle::ExecutionHandle;
use crate::job::{JobId, JobRecord, JobSummary};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// One registered job: its record plus the live execution, if any.
#[derive(Debug, Clone)]
pub struct JobEntry {
    pub record: JobRecord,
    pub execution: Option<ExecutionHandle>,
}

impl JobEntry {
    pub fn new(record: JobRecord) -> Self {
        Self {
            record,
            execution: None,
        }
    }
}

/// Shared map of all known jobs, keyed by id.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<JobId, JobEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a record, replacing any previous entry with the same id.
    pub async fn insert(&self, record: JobRecord) {
        let mut jobs = self.jobs.lock().await;
        jobs.insert(record.id.clone(), JobEntry::new(record));
    }

    /// Number of registered jobs.
    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }

    /// Snapshot of one job's record.
    pub async fn record(&self, id: &JobId) -> Option<JobRecord> {
        let jobs = self.jobs.lock().await;
        jobs.get(id).map(|entry| entry.record.clone())
    }

    /// Applies a closure to one entry under the registry lock.
    ///
    /// This is the building block for compound operations that must see
    /// and mutate an entry atomically, such as checking a status and
    /// attaching an execution in the same critical section.
    pub async fn with_entry<F, T>(&self, id: &JobId, f: F) -> Option<T>
    where
        F: FnOnce(&mut JobEntry) -> T,
    {
        let mut jobs = self.jobs.lock().await;
        jobs.get_mut(id).map(f)
    }

    /// Mutates one record, refreshes its `updated_at`, and returns the
    /// resulting snapshot.
    pub async fn update<F>(&self, id: &JobId, f: F) -> Option<JobRecord>
    where
        F: FnOnce(&mut JobRecord),
    {
        let mut jobs = self.jobs.lock().await;
        let entry = jobs.get_mut(id)?;
        f(&mut entry.record);
        entry.record.touch();
        Some(entry.record.clone())
    }

    /// Attaches an execution handle to a job.
    ///
    /// Returns false if the job is unknown or already has a live
    /// execution attached.
    pub async fn attach_execution(&self, id: &JobId, handle: ExecutionHandle) -> bool {
        let mut jobs = self.jobs.lock().await;
        match jobs.get_mut(id) {
            Some(entry) if entry.execution.is_none() => {
                entry.execution = Some(handle);
                true
            }
            _ => false,
        }
    }

    /// Clears the execution handle for a job, if present.
    pub async fn detach_execution(&self, id: &JobId) {
        let mut jobs = self.jobs.lock().await;
        if let Some(entry) = jobs.get_mut(id) {
            entry.execution = None;
        }
    }

    /// The live execution handle for a job, if one is attached.
    pub async fn execution(&self, id: &JobId) -> Option<ExecutionHandle> {
        let jobs = self.jobs.lock().await;
        jobs.get(id).and_then(|entry| entry.execution.clone())
    }

    /// Removes a job entirely, returning its final entry.
    pub async fn remove(&self, id: &JobId) -> Option<JobEntry> {
        let mut jobs = self.jobs.lock().await;
        jobs.remove(id)
    }

    /// Summaries of every job, oldest first; ties broken by id.
    pub async fn summaries(&self) -> Vec<JobSummary> {
        let jobs = self.jobs.lock().await;
        let mut summaries: Vec<JobSummary> =
            jobs.values().map(|entry| entry.record.summary()).collect();
        summaries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        summaries
    }

    /// Handles for every job with a live execution.
    pub async fn active_executions(&self) -> Vec<ExecutionHandle> {
        let jobs = self.jobs.lock().await;
        jobs.values()
            .filter_map(|entry| entry.execution.clone())
            .collect()
    }
}
