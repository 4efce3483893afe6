//! Execution supervisor.
//!
//! One supervisor task per started job. The supervisor waits for a gate
//! slot, prepares the engine, then drives the run one bounded chunk at a
//! time. Control signals are observed between chunks only, which keeps
//! the engine loop free of locks. Pause parks the task while it keeps
//! holding its gate slot; stop and the shared shutdown token unwind it.
//!
//! Every status transition is written through to the job store. A failed
//! write degrades store health and is otherwise ignored, because the
//! registry's in-memory record stays authoritative for a live process.

use crate::engine::{ComputeEngine, RunSpec};
use crate::executor::config::SupervisorConfig;
use crate::executor::gate::{ExecutionGate, GatePermit};
use crate::executor::handle::ControlSignal;
use crate::executor::registry::JobRegistry;
use crate::job::{JobId, JobProgress, JobRecord, JobStatus};
use crate::store::{JobStore, StoreHealth};
use std::pin::pin;
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Everything a supervisor needs to run one job.
pub(crate) struct SupervisorContext {
    pub job_id: JobId,
    pub registry: Arc<JobRegistry>,
    pub store: Arc<JobStore>,
    pub gate: Arc<ExecutionGate>,
    pub engine: Arc<dyn ComputeEngine>,
    pub config: SupervisorConfig,
    pub default_platform: String,
    pub health: Arc<StoreHealth>,
    pub shutdown: CancellationToken,
}

/// How a driven run ended.
enum RunOutcome {
    Completed(serde_json::Value),
    Failed(String),
    Stopped,
}

/// What the signal drain decided at a chunk boundary.
enum SignalVerdict {
    Continue,
    Stop,
}

/// Spawns the supervisor task for one job.
///
/// The caller has already attached the matching [`ExecutionHandle`] to
/// the registry; the supervisor detaches it on exit, whatever the
/// outcome.
///
/// [`ExecutionHandle`]: crate::executor::handle::ExecutionHandle
pub(crate) fn spawn_supervisor(
    ctx: SupervisorContext,
    status_tx: watch::Sender<JobStatus>,
    signal_rx: mpsc::Receiver<ControlSignal>,
) -> JoinHandle<()> {
    tokio::spawn(run(ctx, status_tx, signal_rx))
}

async fn run(
    ctx: SupervisorContext,
    status_tx: watch::Sender<JobStatus>,
    mut signal_rx: mpsc::Receiver<ControlSignal>,
) {
    execute(&ctx, &status_tx, &mut signal_rx).await;
    ctx.registry.detach_execution(&ctx.job_id).await;
    debug!(job_id = %ctx.job_id, "Supervisor exited");
}

/// Full lifecycle of one run: admission, setup, chunk loop, finalization.
async fn execute(
    ctx: &SupervisorContext,
    status_tx: &watch::Sender<JobStatus>,
    signal_rx: &mut mpsc::Receiver<ControlSignal>,
) {
    // The record keeps its restartable status while queued; it only
    // moves to initializing once a slot is granted.
    let _permit = match admit(ctx, signal_rx).await {
        Some(permit) => permit,
        None => {
            info!(job_id = %ctx.job_id, "Job stopped before acquiring an execution slot");
            transition(ctx, status_tx, |record| record.mark_stopped()).await;
            return;
        }
    };

    let Some(record) = ctx.registry.record(&ctx.job_id).await else {
        warn!(job_id = %ctx.job_id, "Job disappeared from the registry before setup");
        return;
    };

    transition(ctx, status_tx, |record| record.reset_for_start()).await;
    info!(job_id = %ctx.job_id, kind = %record.kind, "Job initializing");

    if let Err(e) = ctx.store.ensure_outputs_dir(&ctx.job_id) {
        warn!(job_id = %ctx.job_id, error = %e, "Could not create outputs directory");
        fail(ctx, status_tx, format!("could not create outputs directory: {e}")).await;
        return;
    }

    let spec = RunSpec {
        job_id: record.id.clone(),
        config: record.config.clone(),
        outputs_dir: ctx.store.outputs_dir(&ctx.job_id),
        default_platform: ctx.default_platform.clone(),
    };

    let mut engine_run = match ctx.engine.prepare(&spec).await {
        Ok(engine_run) => engine_run,
        Err(e) => {
            warn!(job_id = %ctx.job_id, engine = ctx.engine.name(), error = %e, "Engine setup failed");
            fail(ctx, status_tx, e.to_string()).await;
            return;
        }
    };

    let total_units = engine_run.total_units();
    let initial_phase = engine_run.phase().to_string();
    update_and_persist(ctx, move |record| {
        record.progress = JobProgress::with_total(total_units);
        record.progress.phase = Some(initial_phase);
    })
    .await;

    if let Err(e) = engine_run.warm_up().await {
        warn!(job_id = %ctx.job_id, error = %e, "Engine warm-up failed");
        engine_run.release().await;
        fail(ctx, status_tx, e.to_string()).await;
        return;
    }

    let outcome = drive(ctx, status_tx, signal_rx, engine_run.as_mut()).await;
    engine_run.release().await;

    match outcome {
        RunOutcome::Completed(result) => {
            info!(job_id = %ctx.job_id, "Job completed");
            transition(ctx, status_tx, move |record| record.mark_completed(result)).await;
        }
        RunOutcome::Failed(message) => {
            warn!(job_id = %ctx.job_id, error = %message, "Job failed");
            fail(ctx, status_tx, message).await;
        }
        RunOutcome::Stopped => {
            info!(job_id = %ctx.job_id, "Job stopped");
            transition(ctx, status_tx, |record| record.mark_stopped()).await;
        }
    }
}

/// Waits for a gate slot while staying responsive to stop and shutdown.
///
/// Returns `None` when the job was asked to stop before a slot freed;
/// queue position is kept across signal wakeups because the acquire
/// future is polled in place rather than recreated.
async fn admit(
    ctx: &SupervisorContext,
    signal_rx: &mut mpsc::Receiver<ControlSignal>,
) -> Option<GatePermit> {
    let gate = Arc::clone(&ctx.gate);
    let mut acquire = pin!(gate.acquire());

    loop {
        tokio::select! {
            biased;

            _ = ctx.shutdown.cancelled() => return None,

            signal = signal_rx.recv() => match signal {
                Some(ControlSignal::Stop) | None => return None,
                Some(other) => {
                    debug!(job_id = %ctx.job_id, signal = %other, "Ignoring signal while queued");
                }
            },

            permit = &mut acquire => return Some(permit),
        }
    }
}

/// Chunk loop: drain signals, run a chunk, publish progress, checkpoint
/// on cadence, until the run is exhausted or unwound.
async fn drive(
    ctx: &SupervisorContext,
    status_tx: &watch::Sender<JobStatus>,
    signal_rx: &mut mpsc::Receiver<ControlSignal>,
    engine_run: &mut dyn crate::engine::EngineRun,
) -> RunOutcome {
    transition(ctx, status_tx, |record| record.status = JobStatus::Running).await;
    info!(job_id = %ctx.job_id, "Job running");

    let mut units_since_checkpoint: u64 = 0;

    loop {
        match apply_signals(ctx, status_tx, signal_rx).await {
            SignalVerdict::Continue => {}
            SignalVerdict::Stop => return RunOutcome::Stopped,
        }

        let outcome = match engine_run.run_chunk(ctx.config.chunk_size).await {
            Ok(outcome) => outcome,
            Err(e) => return RunOutcome::Failed(e.to_string()),
        };

        let phase = engine_run.phase().to_string();
        update_and_persist(ctx, move |record| {
            record.progress.advance(outcome.units_completed);
            record.progress.phase = Some(phase);
        })
        .await;

        units_since_checkpoint += outcome.units_completed;

        if !outcome.exhausted
            && checkpoint_due(ctx.config.checkpoint_interval, units_since_checkpoint)
        {
            match engine_run.checkpoint().await {
                Ok(Some(blob)) => {
                    if let Err(e) =
                        ctx.store.write_output(&ctx.job_id, &blob.file_name, &blob.bytes)
                    {
                        return RunOutcome::Failed(format!("checkpoint write failed: {e}"));
                    }
                    debug!(job_id = %ctx.job_id, file = %blob.file_name, "Checkpoint written");
                    units_since_checkpoint = 0;
                }
                Ok(None) => units_since_checkpoint = 0,
                Err(e) => return RunOutcome::Failed(e.to_string()),
            }
        }

        if outcome.exhausted {
            break;
        }
    }

    match engine_run.collect_results().await {
        Ok(result) => RunOutcome::Completed(result),
        Err(e) => RunOutcome::Failed(e.to_string()),
    }
}

/// Drains pending control signals at a chunk boundary.
async fn apply_signals(
    ctx: &SupervisorContext,
    status_tx: &watch::Sender<JobStatus>,
    signal_rx: &mut mpsc::Receiver<ControlSignal>,
) -> SignalVerdict {
    if ctx.shutdown.is_cancelled() {
        transition(ctx, status_tx, |record| record.status = JobStatus::Stopping).await;
        return SignalVerdict::Stop;
    }

    loop {
        match signal_rx.try_recv() {
            Ok(ControlSignal::Stop) => {
                transition(ctx, status_tx, |record| record.status = JobStatus::Stopping).await;
                return SignalVerdict::Stop;
            }
            Ok(ControlSignal::Pause) => {
                match pause_until_resumed(ctx, status_tx, signal_rx).await {
                    SignalVerdict::Continue => {}
                    SignalVerdict::Stop => return SignalVerdict::Stop,
                }
            }
            Ok(ControlSignal::Resume) => {
                // Resume without a preceding pause has nothing to do.
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                return SignalVerdict::Continue;
            }
        }
    }
}

/// Parks the run as `paused` until resumed, stopped, or shut down.
///
/// The gate slot stays held for the whole pause, so a paused job still
/// counts against `max_concurrent_jobs`.
async fn pause_until_resumed(
    ctx: &SupervisorContext,
    status_tx: &watch::Sender<JobStatus>,
    signal_rx: &mut mpsc::Receiver<ControlSignal>,
) -> SignalVerdict {
    transition(ctx, status_tx, |record| record.status = JobStatus::Paused).await;
    info!(job_id = %ctx.job_id, "Job paused");

    loop {
        tokio::select! {
            biased;

            _ = ctx.shutdown.cancelled() => {
                transition(ctx, status_tx, |record| record.status = JobStatus::Stopping).await;
                return SignalVerdict::Stop;
            }

            signal = signal_rx.recv() => match signal {
                Some(ControlSignal::Resume) => {
                    transition(ctx, status_tx, |record| record.status = JobStatus::Running).await;
                    info!(job_id = %ctx.job_id, "Job resumed");
                    return SignalVerdict::Continue;
                }
                Some(ControlSignal::Stop) | None => {
                    transition(ctx, status_tx, |record| record.status = JobStatus::Stopping).await;
                    return SignalVerdict::Stop;
                }
                Some(ControlSignal::Pause) => {
                    // Already paused.
                }
            },
        }
    }
}

/// Applies a record mutation, persists it, and broadcasts the new status.
async fn transition<F>(ctx: &SupervisorContext, status_tx: &watch::Sender<JobStatus>, f: F)
where
    F: FnOnce(&mut JobRecord),
{
    if let Some(record) = update_and_persist(ctx, f).await {
        let _ = status_tx.send(record.status);
    }
}

/// Marks the job failed with the given diagnostic.
async fn fail(ctx: &SupervisorContext, status_tx: &watch::Sender<JobStatus>, message: String) {
    transition(ctx, status_tx, move |record| record.mark_failed(message)).await;
}

/// Applies a record mutation in the registry and writes it through to
/// the store.
async fn update_and_persist<F>(ctx: &SupervisorContext, f: F) -> Option<JobRecord>
where
    F: FnOnce(&mut JobRecord),
{
    let record = ctx.registry.update(&ctx.job_id, f).await?;
    persist(ctx, &record).await;
    Some(record)
}

/// Best-effort durable write of the current record.
async fn persist(ctx: &SupervisorContext, record: &JobRecord) {
    match ctx.store.save(record) {
        Ok(()) => ctx.health.record_write_success(),
        Err(e) => {
            warn!(
                job_id = %record.id,
                error = %e,
                "Failed to persist job record; in-memory state stays authoritative"
            );
            ctx.health.record_write_failure(&e);
        }
    }
}

/// True when enough units have run since the last checkpoint. An
/// interval of zero disables checkpointing.
fn checkpoint_due(interval: u64, units_since_checkpoint: u64) -> bool {
    interval > 0 && units_since_checkpoint >= interval
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NullEngine;
    use crate::executor::handle::{ExecutionHandle, SIGNAL_CHANNEL_CAPACITY};
    use crate::job::JobKind;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    struct TestRun {
        registry: Arc<JobRegistry>,
        store: Arc<JobStore>,
        gate: Arc<ExecutionGate>,
        job_id: JobId,
        status_rx: watch::Receiver<JobStatus>,
        signal_tx: mpsc::Sender<ControlSignal>,
        shutdown: CancellationToken,
        task: JoinHandle<()>,
    }

    async fn start_run(
        dir: &TempDir,
        engine: NullEngine,
        gate: Arc<ExecutionGate>,
        config: SupervisorConfig,
    ) -> TestRun {
        let store = Arc::new(JobStore::open(dir.path()).unwrap());
        let registry = Arc::new(JobRegistry::new());

        let record = JobRecord::new(JobKind::MolecularDynamics, serde_json::Map::new());
        let job_id = record.id.clone();
        store.save(&record).unwrap();
        registry.insert(record).await;

        let (status_tx, status_rx) = watch::channel(JobStatus::Pending);
        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_CHANNEL_CAPACITY);
        let handle = ExecutionHandle::new(job_id.clone(), status_rx.clone(), signal_tx.clone());
        registry.attach_execution(&job_id, handle).await;

        let shutdown = CancellationToken::new();
        let ctx = SupervisorContext {
            job_id: job_id.clone(),
            registry: Arc::clone(&registry),
            store: Arc::clone(&store),
            gate: Arc::clone(&gate),
            engine: Arc::new(engine),
            config,
            default_platform: "auto".to_string(),
            health: Arc::new(StoreHealth::new()),
            shutdown: shutdown.clone(),
        };
        let task = spawn_supervisor(ctx, status_tx, signal_rx);

        TestRun {
            registry,
            store,
            gate,
            job_id,
            status_rx,
            signal_tx,
            shutdown,
            task,
        }
    }

    async fn wait_for_status(rx: &mut watch::Receiver<JobStatus>, target: JobStatus) {
        timeout(WAIT, async {
            loop {
                if *rx.borrow_and_update() == target {
                    return;
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap();
    }

    async fn join(task: JoinHandle<()>) {
        timeout(WAIT, task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_run_completes_and_persists_result() {
        let dir = TempDir::new().unwrap();
        let engine = NullEngine::new(JobKind::MolecularDynamics).with_total_units(10);
        let counters = engine.counters();
        let gate = Arc::new(ExecutionGate::new(2));

        let run = start_run(&dir, engine, gate, SupervisorConfig::new(4, 0)).await;
        join(run.task).await;

        let record = run.registry.record(&run.job_id).await.unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.progress.completed_units, 10);
        assert_eq!(record.progress.total_units, 10);
        assert_eq!(record.result.unwrap()["units_completed"], 10);
        assert!(record.error.is_none());

        let on_disk = run.store.load(&run.job_id).unwrap();
        assert_eq!(on_disk.status, JobStatus::Completed);

        assert_eq!(counters.prepared_runs(), 1);
        assert_eq!(counters.released_runs(), 1);
        assert_eq!(run.gate.in_flight(), 0);
        assert_eq!(run.gate.available(), 2);
    }

    #[tokio::test]
    async fn test_stop_while_queued_finalizes_without_engine_setup() {
        let dir = TempDir::new().unwrap();
        let engine = NullEngine::new(JobKind::MolecularDynamics);
        let counters = engine.counters();
        let gate = Arc::new(ExecutionGate::new(1));
        let occupied = gate.try_acquire().unwrap();

        let run = start_run(&dir, engine, Arc::clone(&gate), SupervisorConfig::default()).await;
        run.signal_tx.try_send(ControlSignal::Stop).unwrap();
        join(run.task).await;

        let record = run.registry.record(&run.job_id).await.unwrap();
        assert_eq!(record.status, JobStatus::Stopped);
        assert_eq!(counters.prepared_runs(), 0);

        drop(occupied);
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_while_queued_finalizes_stopped() {
        let dir = TempDir::new().unwrap();
        let engine = NullEngine::new(JobKind::MolecularDynamics);
        let gate = Arc::new(ExecutionGate::new(1));
        let _occupied = gate.try_acquire().unwrap();

        let run = start_run(&dir, engine, Arc::clone(&gate), SupervisorConfig::default()).await;
        run.shutdown.cancel();
        join(run.task).await;

        let record = run.registry.record(&run.job_id).await.unwrap();
        assert_eq!(record.status, JobStatus::Stopped);
    }

    #[tokio::test]
    async fn test_prepare_failure_marks_failed_and_frees_slot() {
        let dir = TempDir::new().unwrap();
        let engine =
            NullEngine::new(JobKind::MolecularDynamics).with_prepare_fault("no input geometry");
        let gate = Arc::new(ExecutionGate::new(1));

        let run = start_run(&dir, engine, Arc::clone(&gate), SupervisorConfig::default()).await;
        join(run.task).await;

        let record = run.registry.record(&run.job_id).await.unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert!(record.error.unwrap().contains("no input geometry"));
        assert!(record.result.is_none());
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_chunk_fault_marks_failed_and_keeps_progress() {
        let dir = TempDir::new().unwrap();
        let engine = NullEngine::new(JobKind::MolecularDynamics)
            .with_total_units(10)
            .with_chunk_fault_after(6);
        let counters = engine.counters();
        let gate = Arc::new(ExecutionGate::new(1));

        let run = start_run(&dir, engine, gate, SupervisorConfig::new(4, 0)).await;
        join(run.task).await;

        // Chunks of 4 land at 4 then 8; the third chunk faults.
        let record = run.registry.record(&run.job_id).await.unwrap();
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.progress.completed_units, 8);
        assert_eq!(record.progress.total_units, 10);
        assert!(record.error.unwrap().contains("injected fault"));
        assert_eq!(counters.released_runs(), 1);
    }

    #[tokio::test]
    async fn test_pause_freezes_progress_and_resume_completes() {
        let dir = TempDir::new().unwrap();
        let engine = NullEngine::new(JobKind::MolecularDynamics)
            .with_total_units(10)
            .with_chunk_delay(Duration::from_millis(10));
        let gate = Arc::new(ExecutionGate::new(1));

        let mut run = start_run(&dir, engine, gate, SupervisorConfig::new(1, 0)).await;
        wait_for_status(&mut run.status_rx, JobStatus::Running).await;

        run.signal_tx.try_send(ControlSignal::Pause).unwrap();
        wait_for_status(&mut run.status_rx, JobStatus::Paused).await;

        let paused = run.registry.record(&run.job_id).await.unwrap();
        assert!(paused.progress.completed_units < 10);
        assert_eq!(run.store.load(&run.job_id).unwrap().status, JobStatus::Paused);

        // Progress must not move while paused.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let still_paused = run.registry.record(&run.job_id).await.unwrap();
        assert_eq!(
            still_paused.progress.completed_units,
            paused.progress.completed_units
        );

        run.signal_tx.try_send(ControlSignal::Resume).unwrap();
        join(run.task).await;

        let record = run.registry.record(&run.job_id).await.unwrap();
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.progress.completed_units, 10);
    }

    #[tokio::test]
    async fn test_stop_during_run_finalizes_stopped() {
        let dir = TempDir::new().unwrap();
        let engine = NullEngine::new(JobKind::MolecularDynamics)
            .with_total_units(1_000)
            .with_chunk_delay(Duration::from_millis(10));
        let counters = engine.counters();
        let gate = Arc::new(ExecutionGate::new(1));

        let mut run = start_run(&dir, engine, Arc::clone(&gate), SupervisorConfig::new(1, 0)).await;
        wait_for_status(&mut run.status_rx, JobStatus::Running).await;

        run.signal_tx.try_send(ControlSignal::Stop).unwrap();
        join(run.task).await;

        let record = run.registry.record(&run.job_id).await.unwrap();
        assert_eq!(record.status, JobStatus::Stopped);
        assert!(record.progress.completed_units < 1_000);
        assert!(record.result.is_none());
        assert_eq!(counters.released_runs(), 1);
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_stop_while_paused_finalizes_stopped() {
        let dir = TempDir::new().unwrap();
        let engine = NullEngine::new(JobKind::MolecularDynamics)
            .with_total_units(1_000)
            .with_chunk_delay(Duration::from_millis(10));
        let gate = Arc::new(ExecutionGate::new(1));

        let mut run = start_run(&dir, engine, gate, SupervisorConfig::new(1, 0)).await;
        wait_for_status(&mut run.status_rx, JobStatus::Running).await;

        run.signal_tx.try_send(ControlSignal::Pause).unwrap();
        wait_for_status(&mut run.status_rx, JobStatus::Paused).await;

        run.signal_tx.try_send(ControlSignal::Stop).unwrap();
        join(run.task).await;

        let record = run.registry.record(&run.job_id).await.unwrap();
        assert_eq!(record.status, JobStatus::Stopped);
    }

    #[tokio::test]
    async fn test_shutdown_unwinds_active_run() {
        let dir = TempDir::new().unwrap();
        let engine = NullEngine::new(JobKind::MolecularDynamics)
            .with_total_units(1_000)
            .with_chunk_delay(Duration::from_millis(10));
        let gate = Arc::new(ExecutionGate::new(1));

        let mut run = start_run(&dir, engine, gate, SupervisorConfig::new(1, 0)).await;
        wait_for_status(&mut run.status_rx, JobStatus::Running).await;

        run.shutdown.cancel();
        join(run.task).await;

        let record = run.registry.record(&run.job_id).await.unwrap();
        assert_eq!(record.status, JobStatus::Stopped);
        assert_eq!(run.store.load(&run.job_id).unwrap().status, JobStatus::Stopped);
    }

    #[tokio::test]
    async fn test_supervisor_detaches_execution_on_exit() {
        let dir = TempDir::new().unwrap();
        let engine = NullEngine::new(JobKind::MolecularDynamics).with_total_units(4);
        let gate = Arc::new(ExecutionGate::new(1));

        let run = start_run(&dir, engine, gate, SupervisorConfig::new(2, 0)).await;
        join(run.task).await;

        assert!(run.registry.execution(&run.job_id).await.is_none());
    }

    #[test]
    fn test_checkpoint_due() {
        assert!(!checkpoint_due(0, 1_000_000));
        assert!(!checkpoint_due(100, 99));
        assert!(checkpoint_due(100, 100));
        assert!(checkpoint_due(100, 250));
    }
}
