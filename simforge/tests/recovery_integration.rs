//! Integration tests for crash recovery and restart.
//!
//! These tests simulate process death by writing job records straight to
//! the store, then opening an orchestrator over the same directory:
//! - Statuses left mid-execution relabel to interrupted
//! - Paused records survive restart and resume as a fresh run
//! - Interrupted and stopped jobs restart from scratch
//! - Corrupt records are skipped without failing startup

use serde_json::{json, Value};
use simforge::engine::{ComputeEngine, EngineMap, NullEngine};
use simforge::job::{JobId, JobKind, JobProgress, JobRecord, JobStatus};
use simforge::orchestrator::{Orchestrator, OrchestratorConfig};
use simforge::store::{JobStore, RECORD_FILE};
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

// =============================================================================
// Test Helpers
// =============================================================================

const WAIT: Duration = Duration::from_secs(5);

fn md_params(steps: u64) -> serde_json::Map<String, Value> {
    let mut params = serde_json::Map::new();
    params.insert("steps".to_string(), json!(steps));
    params
}

fn engines_with(engine: NullEngine) -> EngineMap {
    let mut engines: EngineMap = HashMap::new();
    engines.insert(engine.kind(), Arc::new(engine));
    engines
}

fn config_for(dir: &TempDir) -> OrchestratorConfig {
    OrchestratorConfig::default()
        .with_data_dir(dir.path().join("jobs"))
        .with_max_concurrent_jobs(2)
        .with_chunk_size(4)
        .with_checkpoint_interval(0)
}

async fn open_with_null(dir: &TempDir, engine: NullEngine) -> Orchestrator {
    Orchestrator::with_engines(config_for(dir), engines_with(engine))
        .await
        .unwrap()
}

fn store_for(dir: &TempDir) -> JobStore {
    JobStore::open(dir.path().join("jobs")).unwrap()
}

/// Writes a record as a previous process would have left it.
fn seed(store: &JobStore, mutate: impl FnOnce(&mut JobRecord)) -> JobId {
    let mut record = JobRecord::new(JobKind::MolecularDynamics, md_params(10));
    mutate(&mut record);
    store.save(&record).unwrap();
    record.id
}

fn in_progress(status: JobStatus, completed: u64, total: u64) -> impl FnOnce(&mut JobRecord) {
    move |record: &mut JobRecord| {
        record.status = status;
        record.progress = JobProgress::with_total(total);
        record.progress.advance(completed);
    }
}

async fn wait_terminal(orchestrator: &Orchestrator, id: &JobId) -> JobStatus {
    timeout(WAIT, orchestrator.wait(id)).await.unwrap().unwrap()
}

// =============================================================================
// Startup Recovery
// =============================================================================

#[tokio::test]
async fn test_mid_execution_statuses_relabel_to_interrupted() {
    let dir = TempDir::new().unwrap();
    let store = store_for(&dir);

    let running = seed(&store, in_progress(JobStatus::Running, 30, 100));
    let initializing = seed(&store, in_progress(JobStatus::Initializing, 0, 100));
    let stopping = seed(&store, in_progress(JobStatus::Stopping, 50, 100));
    let paused = seed(&store, in_progress(JobStatus::Paused, 4, 10));
    let pending = seed(&store, |_| {});
    let completed = seed(&store, |record| {
        record.progress = JobProgress::with_total(10);
        record.progress.advance(10);
        record.mark_completed(json!({ "ok": true }));
    });
    drop(store);

    let orchestrator = open_with_null(&dir, NullEngine::new(JobKind::MolecularDynamics)).await;
    assert_eq!(orchestrator.list().await.len(), 6);

    // The three mid-execution statuses come back interrupted.
    for id in [&running, &initializing, &stopping] {
        assert_eq!(
            orchestrator.status(id).await.unwrap(),
            JobStatus::Interrupted
        );
    }

    // Everything else keeps what it had.
    assert_eq!(orchestrator.status(&paused).await.unwrap(), JobStatus::Paused);
    assert_eq!(
        orchestrator.status(&pending).await.unwrap(),
        JobStatus::Pending
    );
    assert_eq!(
        orchestrator.status(&completed).await.unwrap(),
        JobStatus::Completed
    );
    assert_eq!(
        orchestrator.results(&completed).await.unwrap(),
        json!({ "ok": true })
    );

    // Progress made before the crash is preserved.
    let progress = orchestrator.progress(&running).await.unwrap();
    assert_eq!(progress.completed_units, 30);
    assert_eq!(progress.total_units, 100);

    // The relabel is durable, not just in memory.
    let store = store_for(&dir);
    assert_eq!(store.load(&running).unwrap().status, JobStatus::Interrupted);
    assert_eq!(store.load(&paused).unwrap().status, JobStatus::Paused);
}

#[tokio::test]
async fn test_corrupt_record_skipped_on_startup() {
    let dir = TempDir::new().unwrap();
    let store = store_for(&dir);
    let good = seed(&store, |_| {});
    drop(store);

    let bad_dir = dir.path().join("jobs").join("deadbeef");
    fs::create_dir_all(&bad_dir).unwrap();
    fs::write(bad_dir.join(RECORD_FILE), b"{ not json").unwrap();

    let orchestrator = open_with_null(&dir, NullEngine::new(JobKind::MolecularDynamics)).await;

    let summaries = orchestrator.list().await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, good);
}

// =============================================================================
// Restart After Recovery
// =============================================================================

#[tokio::test]
async fn test_interrupted_job_restarts_and_completes() {
    let dir = TempDir::new().unwrap();
    let store = store_for(&dir);
    let id = seed(&store, in_progress(JobStatus::Running, 30, 100));
    drop(store);

    let orchestrator = open_with_null(&dir, NullEngine::new(JobKind::MolecularDynamics)).await;
    assert_eq!(
        orchestrator.status(&id).await.unwrap(),
        JobStatus::Interrupted
    );

    orchestrator.start(&id).await.unwrap();
    assert_eq!(wait_terminal(&orchestrator, &id).await, JobStatus::Completed);

    // The fresh run starts over and finishes the engine's ten units.
    let record = orchestrator.record(&id).await.unwrap();
    assert_eq!(record.progress.completed_units, 10);
    assert_eq!(record.progress.total_units, 10);
    assert!(record.result.is_some());
    assert!(record.error.is_none());
}

#[tokio::test]
async fn test_paused_record_resumes_as_a_fresh_run() {
    let dir = TempDir::new().unwrap();
    let store = store_for(&dir);
    let id = seed(&store, in_progress(JobStatus::Paused, 4, 10));
    drop(store);

    let engine = NullEngine::new(JobKind::MolecularDynamics);
    let counters = engine.counters();
    let orchestrator = open_with_null(&dir, engine).await;
    assert_eq!(orchestrator.status(&id).await.unwrap(), JobStatus::Paused);

    // The engine state died with the pausing process, so resume launches
    // a new run from the beginning.
    orchestrator.resume(&id).await.unwrap();
    assert_eq!(wait_terminal(&orchestrator, &id).await, JobStatus::Completed);

    let progress = orchestrator.progress(&id).await.unwrap();
    assert_eq!(progress.completed_units, 10);
    assert_eq!(counters.prepared_runs(), 1);
}

#[tokio::test]
async fn test_stopped_job_restarts_from_scratch() {
    let dir = TempDir::new().unwrap();
    let store = store_for(&dir);
    let id = seed(&store, |record| {
        record.progress = JobProgress::with_total(10);
        record.progress.advance(7);
        record.mark_stopped();
    });
    drop(store);

    let orchestrator = open_with_null(&dir, NullEngine::new(JobKind::MolecularDynamics)).await;
    assert_eq!(orchestrator.status(&id).await.unwrap(), JobStatus::Stopped);

    orchestrator.start(&id).await.unwrap();
    assert_eq!(wait_terminal(&orchestrator, &id).await, JobStatus::Completed);

    let record = orchestrator.record(&id).await.unwrap();
    assert_eq!(record.progress.completed_units, 10);
    assert!(record.result.is_some());
}
