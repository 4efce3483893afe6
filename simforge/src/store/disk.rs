//! Filesystem-backed job store.

use super::path;
use super::types::StoreError;
use crate::job::{JobId, JobRecord, JobStatus};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Durable store holding one directory per job.
///
/// All I/O is synchronous `std::fs`; every record write goes through a
/// temp-file-then-rename sequence so a reader (or a crashed process) only
/// ever sees a complete record. The store has no in-memory index; the
/// registry owns the live view and the store is its durability layer.
pub struct JobStore {
    root: PathBuf,
}

impl JobStore {
    /// Opens the store, creating the root directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "Opened job store");
        Ok(Self { root })
    }

    /// Returns the store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything belonging to one job.
    pub fn job_dir(&self, id: &JobId) -> PathBuf {
        path::job_dir(&self.root, id)
    }

    /// Outputs directory for one job. Not created until
    /// [`ensure_outputs_dir`](Self::ensure_outputs_dir) runs.
    pub fn outputs_dir(&self, id: &JobId) -> PathBuf {
        path::outputs_dir(&self.root, id)
    }

    /// Creates (if needed) and returns the outputs directory for a job.
    pub fn ensure_outputs_dir(&self, id: &JobId) -> Result<PathBuf, StoreError> {
        let dir = self.outputs_dir(id);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Durably writes a record.
    ///
    /// The bytes go to `record.json.tmp`, are flushed to disk, and the file
    /// is renamed over `record.json`. The rename is the only observable
    /// mutation; an interrupted save leaves the previous record intact.
    pub fn save(&self, record: &JobRecord) -> Result<(), StoreError> {
        let dir = self.job_dir(&record.id);
        fs::create_dir_all(&dir)?;

        let body = serde_json::to_vec_pretty(record).map_err(StoreError::Encode)?;
        let tmp = dir.join(path::RECORD_TMP_FILE);
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&body)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, dir.join(path::RECORD_FILE))?;
        Ok(())
    }

    /// Loads one record by id.
    pub fn load(&self, id: &JobId) -> Result<JobRecord, StoreError> {
        let path = path::record_path(&self.root, id);
        let body = match fs::read(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&body).map_err(|source| StoreError::Corrupt { path, source })
    }

    /// Loads every record in the store, oldest first.
    ///
    /// Records left `running`, `initializing`, or `stopping` by a previous
    /// process are relabeled `interrupted` and rewritten: whatever owned
    /// them no longer exists, and the job can only continue via a fresh
    /// start. `paused` records are kept as-is so a later resume re-enters
    /// cleanly. Corrupt or incomplete job directories are skipped with a
    /// warning rather than failing the whole scan.
    pub fn load_all(&self) -> Result<Vec<JobRecord>, StoreError> {
        let mut records = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let id = JobId::from(entry.file_name().to_string_lossy().into_owned());

            match self.load(&id) {
                Ok(mut record) => {
                    if matches!(
                        record.status,
                        JobStatus::Running | JobStatus::Initializing | JobStatus::Stopping
                    ) {
                        info!(
                            job_id = %record.id,
                            from = %record.status,
                            "Relabeling job as interrupted after restart"
                        );
                        record.status = JobStatus::Interrupted;
                        record.touch();
                        if let Err(e) = self.save(&record) {
                            warn!(
                                job_id = %record.id,
                                error = %e,
                                "Failed to persist interrupted relabel; keeping in-memory status"
                            );
                        }
                    }
                    records.push(record);
                }
                Err(StoreError::NotFound(_)) => {
                    warn!(
                        path = %entry.path().display(),
                        "Skipping job directory without a record"
                    );
                }
                Err(StoreError::Corrupt { path, source }) => {
                    warn!(
                        path = %path.display(),
                        error = %source,
                        "Skipping corrupt job record"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }

    /// Removes a job directory and everything in it. Removing a job that
    /// has no directory is Ok.
    pub fn delete(&self, id: &JobId) -> Result<(), StoreError> {
        match fs::remove_dir_all(self.job_dir(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes an engine artifact into the job's outputs directory.
    ///
    /// The file name is sanitized to a bare name; the returned path is
    /// where the bytes landed.
    pub fn write_output(
        &self,
        id: &JobId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, StoreError> {
        let dir = self.ensure_outputs_dir(id)?;
        let target = dir.join(path::sanitize_output_name(file_name));
        fs::write(&target, bytes)?;
        Ok(target)
    }
}
