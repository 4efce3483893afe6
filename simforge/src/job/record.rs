//! Durable job record.

use super::id::JobId;
use super::kind::JobKind;
use super::progress::JobProgress;
use super::status::JobStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The full durable state of one job.
///
/// This is exactly what the store serializes to `record.json`. Two
/// invariants hold at every durable write: `result` is present iff the
/// status is `completed`, and `error` is present iff the status is
/// `failed`. The `mark_*` helpers keep both in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique job identifier.
    pub id: JobId,
    /// Which compute engine runs this job.
    pub kind: JobKind,
    /// Engine-specific parameters, opaque to the orchestrator core and
    /// immutable after creation.
    pub config: serde_json::Map<String, Value>,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// Work-unit counters for the current (or last) run.
    #[serde(default)]
    pub progress: JobProgress,
    /// Final output summary. Present iff `status == Completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Fault diagnostic. Present iff `status == Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last durable write.
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Creates a fresh `pending` record with a generated id.
    pub fn new(kind: JobKind, config: serde_json::Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::generate(),
            kind,
            config,
            status: JobStatus::Pending,
            progress: JobProgress::default(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refreshes `updated_at`. Called before every durable write.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Puts the record into `initializing` for a fresh run: progress back
    /// to zero, any previous result or error cleared.
    pub fn reset_for_start(&mut self) {
        self.status = JobStatus::Initializing;
        self.progress = JobProgress::default();
        self.result = None;
        self.error = None;
    }

    /// Finishes the run as `completed` with the given result payload.
    ///
    /// A run that exhausts early (e.g. SCF convergence) clamps the planned
    /// total down to the completed count so the final record reads N/N.
    pub fn mark_completed(&mut self, result: Value) {
        self.status = JobStatus::Completed;
        if self.progress.total_units > self.progress.completed_units {
            self.progress.total_units = self.progress.completed_units;
        }
        self.result = Some(result);
        self.error = None;
    }

    /// Finishes the run as `failed` with a diagnostic message. Progress
    /// made before the fault is retained.
    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.result = None;
        self.error = Some(message.into());
    }

    /// Finishes the run as `stopped`. Progress is retained; result and
    /// error stay absent.
    pub fn mark_stopped(&mut self) {
        self.status = JobStatus::Stopped;
        self.result = None;
        self.error = None;
    }

    /// Returns the listing view of this record.
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id.clone(),
            kind: self.kind,
            status: self.status,
            progress: self.progress.clone(),
            created_at: self.created_at,
        }
    }
}

/// Compact per-job view returned by listing operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub progress: JobProgress,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn md_config(steps: u64) -> serde_json::Map<String, Value> {
        let mut config = serde_json::Map::new();
        config.insert("steps".to_string(), json!(steps));
        config
    }

    #[test]
    fn test_new_record_is_pending_and_empty() {
        let record = JobRecord::new(JobKind::MolecularDynamics, md_config(100));
        assert_eq!(record.status, JobStatus::Pending);
        assert_eq!(record.progress, JobProgress::default());
        assert!(record.result.is_none());
        assert!(record.error.is_none());
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn test_touch_moves_updated_at_forward() {
        let mut record = JobRecord::new(JobKind::ElectronicStructure, md_config(1));
        let before = record.updated_at;
        record.touch();
        assert!(record.updated_at >= before);
    }

    #[test]
    fn test_reset_for_start_clears_previous_run() {
        let mut record = JobRecord::new(JobKind::MolecularDynamics, md_config(10));
        record.progress = JobProgress::with_total(10);
        record.progress.advance(4);
        record.mark_failed("engine fault");

        record.reset_for_start();
        assert_eq!(record.status, JobStatus::Initializing);
        assert_eq!(record.progress, JobProgress::default());
        assert!(record.result.is_none());
        assert!(record.error.is_none());
    }

    #[test]
    fn test_mark_completed_sets_result_and_clamps_total() {
        let mut record = JobRecord::new(JobKind::ElectronicStructure, md_config(1));
        record.progress = JobProgress::with_total(50);
        record.progress.advance(2);

        record.mark_completed(json!({ "converged": true }));
        assert_eq!(record.status, JobStatus::Completed);
        assert_eq!(record.progress.completed_units, 2);
        assert_eq!(record.progress.total_units, 2);
        assert!(record.progress.is_complete());
        assert!(record.result.is_some());
        assert!(record.error.is_none());
    }

    #[test]
    fn test_mark_failed_keeps_partial_progress() {
        let mut record = JobRecord::new(JobKind::MolecularDynamics, md_config(10));
        record.progress = JobProgress::with_total(10);
        record.progress.advance(7);

        record.mark_failed("chunk fault at step 7");
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.progress.completed_units, 7);
        assert_eq!(record.progress.total_units, 10);
        assert_eq!(record.error.as_deref(), Some("chunk fault at step 7"));
        assert!(record.result.is_none());
    }

    #[test]
    fn test_mark_stopped_clears_result_and_error() {
        let mut record = JobRecord::new(JobKind::MolecularDynamics, md_config(10));
        record.progress = JobProgress::with_total(10);
        record.progress.advance(3);

        record.mark_stopped();
        assert_eq!(record.status, JobStatus::Stopped);
        assert_eq!(record.progress.completed_units, 3);
        assert!(record.result.is_none());
        assert!(record.error.is_none());
    }

    #[test]
    fn test_summary_reflects_record() {
        let record = JobRecord::new(JobKind::MolecularDynamics, md_config(5));
        let summary = record.summary();
        assert_eq!(summary.id, record.id);
        assert_eq!(summary.kind, record.kind);
        assert_eq!(summary.status, record.status);
        assert_eq!(summary.created_at, record.created_at);
    }

    #[test]
    fn test_record_json_round_trip_preserves_all_fields() {
        let mut record = JobRecord::new(JobKind::MolecularDynamics, md_config(10));
        record.progress = JobProgress::with_total(10);
        record.progress.advance(10);
        record.progress.phase = Some("dynamics".to_string());
        record.mark_completed(json!({ "steps_completed": 10 }));
        record.touch();

        let json = serde_json::to_string_pretty(&record).unwrap();
        let back: JobRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_record_json_omits_absent_result_and_error() {
        let record = JobRecord::new(JobKind::MolecularDynamics, md_config(10));
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("\"result\""));
        assert!(!json.contains("\"error\""));
    }
}
