//! Durable job persistence.
//!
//! The store is deliberately dumb: a directory per job, a canonical
//! `record.json` written via temp-file-then-rename, and an `outputs/`
//! directory for whatever the engine produces. Crash recovery lives here
//! too: scanning the store at startup relabels records a dead process
//! left mid-execution.

mod disk;
mod health;
mod path;
mod types;

pub use disk::JobStore;
pub use health::{HealthReport, StoreHealth};
pub use path::{sanitize_output_name, OUTPUTS_DIR, RECORD_FILE, RECORD_TMP_FILE};
pub use types::StoreError;
