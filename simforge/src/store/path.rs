//! On-disk layout of the job store.
//!
//! ```text
//! <root>/
//!   <job-id>/
//!     record.json        canonical durable record
//!     record.json.tmp    transient; only exists mid-write
//!     outputs/           engine artifacts (trajectories, logs, checkpoints)
//! ```

use crate::job::JobId;
use std::path::{Path, PathBuf};

/// Canonical record file name inside a job directory.
pub const RECORD_FILE: &str = "record.json";

/// Scratch name the record is written to before the atomic rename.
pub const RECORD_TMP_FILE: &str = "record.json.tmp";

/// Subdirectory holding engine-produced artifacts.
pub const OUTPUTS_DIR: &str = "outputs";

/// Directory holding everything belonging to one job.
pub fn job_dir(root: &Path, id: &JobId) -> PathBuf {
    root.join(id.as_str())
}

/// Path of the canonical record file.
pub fn record_path(root: &Path, id: &JobId) -> PathBuf {
    job_dir(root, id).join(RECORD_FILE)
}

/// Path of the transient record file used during a save.
pub fn record_tmp_path(root: &Path, id: &JobId) -> PathBuf {
    job_dir(root, id).join(RECORD_TMP_FILE)
}

/// Path of the outputs directory for one job.
pub fn outputs_dir(root: &Path, id: &JobId) -> PathBuf {
    job_dir(root, id).join(OUTPUTS_DIR)
}

/// Reduces a requested output path to a bare file name.
///
/// Callers may ask for output files by arbitrary paths; everything an
/// engine writes must land inside the job's `outputs/` directory, so only
/// the final component survives. Degenerate inputs (empty, `.`, `..`)
/// fall back to a fixed name.
pub fn sanitize_output_name(requested: &str) -> String {
    let tail = requested.rsplit(['/', '\\']).next().unwrap_or(requested);
    let tail = tail.trim();
    if tail.is_empty() || tail == "." || tail == ".." {
        "output".to_string()
    } else {
        tail.to_string()
    }
}
