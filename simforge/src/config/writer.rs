//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[store]
; Root directory for job records and engine outputs.
; Every job gets its own subdirectory: <directory>/<job-id>/record.json
; Default: ~/.simforge/jobs
directory = {}

[executor]
; Maximum jobs executing at once; further started jobs queue in FIFO
; order until a slot frees. A paused job still occupies its slot.
; Default: 2
max_concurrent_jobs = {}
; Work units (MD steps / SCF iterations) advanced per chunk.
; Pause and stop requests take effect between chunks, so smaller values
; respond faster at slightly more bookkeeping overhead.
; Default: 1000
chunk_size = {}
; Work units between restart checkpoints written to the job's outputs
; directory. 0 disables periodic checkpoints.
; Default: 10000
checkpoint_interval = {}

[engine]
; Compute platform used when a job's config does not name one:
;   auto      - let the engine pick the fastest available
;   cpu       - force CPU execution
;   cuda      - NVIDIA GPUs
;   opencl    - other GPUs
;   reference - slow deterministic platform for debugging
; Default: auto
default_platform = {}

[logging]
; Directory for log files (default: ~/.simforge/logs)
directory = {}
; Log file name within the logging directory (default: simforge.log)
file = {}
; Default log level when RUST_LOG is not set:
; trace, debug, info, warn, or error (default: info)
level = {}
"#,
        path_to_string(&config.store.directory),
        config.executor.max_concurrent_jobs,
        config.executor.chunk_size,
        config.executor.checkpoint_interval,
        config.engine.default_platform,
        path_to_string(&config.logging.directory),
        config.logging.file,
        config.logging.level,
    )
}

/// Render a path for the INI file.
fn path_to_string(path: &Path) -> String {
    path.display().to_string()
}
