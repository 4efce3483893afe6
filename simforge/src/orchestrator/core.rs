//! The orchestrator façade.
//!
//! [`Orchestrator`] is the single entry point callers use: it owns the
//! registry, the store, the execution gate, and the engine map, and it
//! spawns one supervisor task per started job. All methods take `&self`;
//! the compound check-then-mutate operations go through the registry lock
//! so racing callers observe one consistent lifecycle.
//!
//! # Lifecycle
//!
//! 1. **Open**: [`Orchestrator::open`] loads every durable record (crash
//!    recovery happens in this scan) and seeds the registry.
//! 2. **Operate**: `create`/`start`/`pause`/`resume`/`stop`/`delete` plus
//!    the read-side `status`/`progress`/`results`/`list`/`wait`.
//! 3. **Shutdown**: [`Orchestrator::shutdown`] cancels every supervisor
//!    and waits for them to unwind; interrupted runs finalize as
//!    `stopped` with their progress persisted.

use super::config::OrchestratorConfig;
use super::error::{ControlAction, OrchestratorError};
use crate::engine::{default_engines, EngineMap};
use crate::executor::{
    spawn_supervisor, ExecutionGate, ExecutionHandle, JobRegistry, SupervisorConfig,
    SupervisorContext, SIGNAL_CHANNEL_CAPACITY,
};
use crate::job::{JobId, JobKind, JobProgress, JobRecord, JobStatus, JobSummary};
use crate::store::{sanitize_output_name, HealthReport, JobStore, StoreHealth};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Orchestrates durable, pausable computation jobs.
pub struct Orchestrator {
    registry: Arc<JobRegistry>,
    store: Arc<JobStore>,
    gate: Arc<ExecutionGate>,
    engines: EngineMap,
    config: SupervisorConfig,
    default_platform: String,
    health: Arc<StoreHealth>,
    shutdown: CancellationToken,
    supervisors: Mutex<Vec<JoinHandle<()>>>,
}

/// What `stop` decided under the registry lock.
enum StopVerdict {
    /// A live supervisor took the signal and will finalize the job.
    Signaled,
    /// The job was already stopped or mid-stop.
    AlreadyStopped,
    /// An orphaned active record was finalized directly; persist it.
    Finalized(JobRecord),
    /// Stop is not valid from this status.
    Invalid(JobStatus),
}

impl Orchestrator {
    /// Opens the orchestrator with the production engines (md + dft).
    ///
    /// Loads every record from the data directory; records left
    /// mid-execution by a dead process come back as `interrupted`.
    ///
    /// # Panics
    ///
    /// Panics if `max_concurrent_jobs` or `chunk_size` is zero.
    pub async fn open(config: OrchestratorConfig) -> Result<Self, OrchestratorError> {
        Self::with_engines(config, default_engines()).await
    }

    /// Opens the orchestrator with an injected engine map. Tests use this
    /// to substitute `NullEngine` doubles.
    pub async fn with_engines(
        config: OrchestratorConfig,
        engines: EngineMap,
    ) -> Result<Self, OrchestratorError> {
        let store = JobStore::open(&config.data_dir)?;
        let registry = JobRegistry::new();

        let records = store.load_all()?;
        if !records.is_empty() {
            info!(jobs = records.len(), "Recovered job records from the store");
        }
        for record in records {
            registry.insert(record).await;
        }

        info!(
            data_dir = %store.root().display(),
            max_concurrent_jobs = config.max_concurrent_jobs,
            chunk_size = config.chunk_size,
            "Orchestrator ready"
        );

        Ok(Self {
            registry: Arc::new(registry),
            store: Arc::new(store),
            gate: Arc::new(ExecutionGate::new(config.max_concurrent_jobs)),
            engines,
            config: SupervisorConfig::new(config.chunk_size, config.checkpoint_interval),
            default_platform: config.default_platform,
            health: Arc::new(StoreHealth::new()),
            shutdown: CancellationToken::new(),
            supervisors: Mutex::new(Vec::new()),
        })
    }

    /// Creates a durable `pending` job and returns its id.
    ///
    /// Config values under keys ending in `_file` are rewritten to bare
    /// file names so a job can never reference paths outside its own
    /// directories. The record is written through immediately; if that
    /// write fails the job still exists in memory and health degrades.
    pub async fn create(&self, kind: JobKind, mut config: serde_json::Map<String, Value>) -> JobId {
        sanitize_config(&mut config);
        let record = JobRecord::new(kind, config);
        let id = record.id.clone();
        info!(job_id = %id, kind = %kind, "Job created");
        self.persist(&record);
        self.registry.insert(record).await;
        id
    }

    /// Starts a job: spawns its supervisor, which queues at the gate.
    ///
    /// Valid from `pending`, `stopped`, and `interrupted`. The record
    /// keeps its current status until a slot is granted, so a queued job
    /// remains restart-eligible on disk if the process dies first.
    pub async fn start(&self, id: &JobId) -> Result<(), OrchestratorError> {
        self.launch(id, |status| status.can_start(), ControlAction::Start)
            .await?;
        info!(job_id = %id, "Job queued for execution");
        Ok(())
    }

    /// Requests a pause at the next chunk boundary. Valid on `running`.
    pub async fn pause(&self, id: &JobId) -> Result<(), OrchestratorError> {
        let verdict = self
            .registry
            .with_entry(id, |entry| {
                if entry.record.status == JobStatus::Running {
                    if let Some(handle) = &entry.execution {
                        if handle.pause() {
                            return Ok(());
                        }
                    }
                }
                Err(entry.record.status)
            })
            .await
            .ok_or_else(|| OrchestratorError::UnknownJob(id.clone()))?;

        match verdict {
            Ok(()) => {
                info!(job_id = %id, "Pause requested");
                Ok(())
            }
            Err(status) => Err(OrchestratorError::InvalidTransition {
                id: id.clone(),
                action: ControlAction::Pause,
                status,
            }),
        }
    }

    /// Resumes a paused job.
    ///
    /// With a live supervisor this signals it and the run continues from
    /// the next chunk. A `paused` record with no supervisor (the pausing
    /// process is gone, and the engine state with it) re-enters through a
    /// fresh run instead.
    pub async fn resume(&self, id: &JobId) -> Result<(), OrchestratorError> {
        enum Verdict {
            Signaled,
            Orphaned,
            Invalid(JobStatus),
        }

        let verdict = self
            .registry
            .with_entry(id, |entry| {
                if entry.record.status != JobStatus::Paused {
                    return Verdict::Invalid(entry.record.status);
                }
                match &entry.execution {
                    Some(handle) if handle.resume() => Verdict::Signaled,
                    Some(_) => Verdict::Invalid(entry.record.status),
                    None => Verdict::Orphaned,
                }
            })
            .await
            .ok_or_else(|| OrchestratorError::UnknownJob(id.clone()))?;

        match verdict {
            Verdict::Signaled => {
                info!(job_id = %id, "Resume requested");
                Ok(())
            }
            Verdict::Orphaned => {
                info!(job_id = %id, "Resuming job with no live run; starting over");
                self.launch(id, |status| status.is_paused(), ControlAction::Resume)
                    .await
            }
            Verdict::Invalid(status) => Err(OrchestratorError::InvalidTransition {
                id: id.clone(),
                action: ControlAction::Resume,
                status,
            }),
        }
    }

    /// Requests a cooperative stop.
    ///
    /// A live run (including one still queued at the gate) unwinds at its
    /// next cooperation point and finalizes `stopped`. Stopping an
    /// already `stopped` or `stopping` job is a no-op. A `pending` job
    /// that was never started has nothing to stop and is rejected;
    /// `completed` and `failed` jobs stay what they are.
    pub async fn stop(&self, id: &JobId) -> Result<(), OrchestratorError> {
        let verdict = self
            .registry
            .with_entry(id, |entry| {
                if let Some(handle) = &entry.execution {
                    // A live supervisor owns the record; hand the stop to
                    // it. A failed send means it is already unwinding.
                    let _ = handle.stop();
                    return StopVerdict::Signaled;
                }
                match entry.record.status {
                    JobStatus::Stopped | JobStatus::Stopping => StopVerdict::AlreadyStopped,
                    status if status.is_active() => {
                        // No supervisor owns this record (it was paused or
                        // interrupted under a previous process), so there
                        // is nothing to unwind; finalize it here.
                        entry.record.mark_stopped();
                        entry.record.touch();
                        StopVerdict::Finalized(entry.record.clone())
                    }
                    status => StopVerdict::Invalid(status),
                }
            })
            .await
            .ok_or_else(|| OrchestratorError::UnknownJob(id.clone()))?;

        match verdict {
            StopVerdict::Signaled => {
                info!(job_id = %id, "Stop requested");
                Ok(())
            }
            StopVerdict::AlreadyStopped => Ok(()),
            StopVerdict::Finalized(record) => {
                info!(job_id = %id, "Stopped job with no live run");
                self.persist(&record);
                Ok(())
            }
            StopVerdict::Invalid(status) => Err(OrchestratorError::InvalidTransition {
                id: id.clone(),
                action: ControlAction::Stop,
                status,
            }),
        }
    }

    /// Deletes a job in any state.
    ///
    /// A live run is stopped and awaited first, then the registry entry
    /// and every durable artifact (record, outputs) are removed.
    pub async fn delete(&self, id: &JobId) -> Result<(), OrchestratorError> {
        if self.registry.record(id).await.is_none() {
            return Err(OrchestratorError::UnknownJob(id.clone()));
        }

        if let Some(mut handle) = self.registry.execution(id).await {
            let _ = handle.stop();
            handle.wait().await;
        }

        self.store.delete(id)?;
        if self.registry.remove(id).await.is_none() {
            // Lost a race with a concurrent delete; the job is gone.
            return Err(OrchestratorError::UnknownJob(id.clone()));
        }
        info!(job_id = %id, "Job deleted");
        Ok(())
    }

    /// Applies one [`ControlAction`] to a job.
    pub async fn control(&self, id: &JobId, action: ControlAction) -> Result<(), OrchestratorError> {
        match action {
            ControlAction::Start => self.start(id).await,
            ControlAction::Pause => self.pause(id).await,
            ControlAction::Resume => self.resume(id).await,
            ControlAction::Stop => self.stop(id).await,
            ControlAction::Delete => self.delete(id).await,
        }
    }

    /// Snapshot of one job's full record.
    pub async fn record(&self, id: &JobId) -> Result<JobRecord, OrchestratorError> {
        self.registry
            .record(id)
            .await
            .ok_or_else(|| OrchestratorError::UnknownJob(id.clone()))
    }

    /// Current lifecycle status of one job.
    pub async fn status(&self, id: &JobId) -> Result<JobStatus, OrchestratorError> {
        Ok(self.record(id).await?.status)
    }

    /// Current progress counters of one job.
    pub async fn progress(&self, id: &JobId) -> Result<JobProgress, OrchestratorError> {
        Ok(self.record(id).await?.progress)
    }

    /// Final results of a completed job.
    pub async fn results(&self, id: &JobId) -> Result<Value, OrchestratorError> {
        let record = self.record(id).await?;
        match record.status {
            JobStatus::Completed => Ok(record.result.unwrap_or(Value::Null)),
            status => Err(OrchestratorError::ResultsNotReady {
                id: id.clone(),
                status,
            }),
        }
    }

    /// Summaries of every known job, oldest first.
    pub async fn list(&self) -> Vec<JobSummary> {
        self.registry.summaries().await
    }

    /// Waits until a job's current run reaches a terminal status.
    ///
    /// A job with no live run returns its current status immediately.
    pub async fn wait(&self, id: &JobId) -> Result<JobStatus, OrchestratorError> {
        match self.registry.execution(id).await {
            Some(mut handle) => Ok(handle.wait().await),
            None => self.status(id).await,
        }
    }

    /// Current persistence health.
    pub fn health(&self) -> HealthReport {
        self.health.report()
    }

    /// The concurrency gate, for instrumentation.
    pub fn gate(&self) -> &ExecutionGate {
        &self.gate
    }

    /// Root directory of the durable store.
    pub fn store_root(&self) -> &Path {
        self.store.root()
    }

    /// Outputs directory of one job.
    pub fn outputs_dir(&self, id: &JobId) -> PathBuf {
        self.store.outputs_dir(id)
    }

    /// Shuts down: every queued or running supervisor unwinds as a stop,
    /// and this waits for all of them. Jobs it interrupts finalize as
    /// `stopped` with their progress persisted.
    pub async fn shutdown(self) {
        info!("Shutting down orchestrator");
        self.shutdown.cancel();

        let handles: Vec<JoinHandle<()>> = self
            .supervisors
            .lock()
            .map(|mut guard| guard.drain(..).collect())
            .unwrap_or_default();
        let count = handles.len();
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Supervisor task panicked during shutdown");
            }
        }
        if count > 0 {
            debug!(supervisors = count, "All supervisors unwound");
        }
        info!("Orchestrator stopped");
    }

    /// Validates under the registry lock, attaches a fresh execution
    /// handle, and spawns the supervisor.
    ///
    /// `valid` decides which statuses may launch. The status check and
    /// the attach happen in one critical section, so two racing callers
    /// can never both spawn a supervisor for the same job.
    async fn launch(
        &self,
        id: &JobId,
        valid: fn(JobStatus) -> bool,
        action: ControlAction,
    ) -> Result<(), OrchestratorError> {
        let record = self
            .registry
            .record(id)
            .await
            .ok_or_else(|| OrchestratorError::UnknownJob(id.clone()))?;
        let engine = self
            .engines
            .get(&record.kind)
            .map(Arc::clone)
            .ok_or(OrchestratorError::EngineUnavailable(record.kind))?;

        let attached = self
            .registry
            .with_entry(id, |entry| {
                if entry.execution.is_some() || !valid(entry.record.status) {
                    return Err(entry.record.status);
                }
                let (status_tx, status_rx) = watch::channel(entry.record.status);
                let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_CHANNEL_CAPACITY);
                entry.execution = Some(ExecutionHandle::new(
                    entry.record.id.clone(),
                    status_rx,
                    signal_tx,
                ));
                Ok((status_tx, signal_rx))
            })
            .await
            .ok_or_else(|| OrchestratorError::UnknownJob(id.clone()))?;

        let (status_tx, signal_rx) = match attached {
            Ok(channels) => channels,
            Err(status) => {
                return Err(OrchestratorError::InvalidTransition {
                    id: id.clone(),
                    action,
                    status,
                });
            }
        };

        let ctx = SupervisorContext {
            job_id: id.clone(),
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
            gate: Arc::clone(&self.gate),
            engine,
            config: self.config,
            default_platform: self.default_platform.clone(),
            health: Arc::clone(&self.health),
            shutdown: self.shutdown.clone(),
        };
        self.track(spawn_supervisor(ctx, status_tx, signal_rx));
        Ok(())
    }

    /// Keeps the supervisor's join handle for shutdown. Handles of
    /// finished supervisors are pruned on the way in.
    fn track(&self, handle: JoinHandle<()>) {
        if let Ok(mut guard) = self.supervisors.lock() {
            guard.retain(|h| !h.is_finished());
            guard.push(handle);
        }
    }

    /// Writes a record through to the store, tracking health. The
    /// in-memory record stays authoritative if the write fails.
    fn persist(&self, record: &JobRecord) {
        match self.store.save(record) {
            Ok(()) => self.health.record_write_success(),
            Err(e) => {
                warn!(job_id = %record.id, error = %e, "Failed to persist job record");
                self.health.record_write_failure(&e);
            }
        }
    }
}

/// Rewrites path-like config values to bare file names.
///
/// Values under keys ending in `_file` are caller-supplied paths; only
/// the final component survives, so jobs cannot reference files outside
/// their own directories.
fn sanitize_config(config: &mut serde_json::Map<String, Value>) {
    for (key, value) in config.iter_mut() {
        if !key.ends_with("_file") {
            continue;
        }
        if let Value::String(s) = value {
            let name = sanitize_output_name(s);
            if *s != name {
                debug!(key = %key, "Rewrote config path to a bare file name");
                *s = name;
            }
        }
    }
}
