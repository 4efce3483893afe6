//! Configuration management for SimForge.
//!
//! Configuration is stored as an INI file at `~/.simforge/config.ini` and
//! loaded in layers: built-in defaults first, then values from the file on
//! top. A missing file is not an error; it simply yields the defaults.
//!
//! The pieces:
//!
//! - [`ConfigFile`] and the per-section settings structs ([`StoreSettings`],
//!   [`ExecutorSettings`], [`EngineSettings`], [`LoggingSettings`])
//! - [`ConfigKey`] for `config get`/`config set` style access by dotted
//!   key name, with per-key validation
//! - Load/save plumbing with tilde expansion for paths

mod defaults;
mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use defaults::{default_store_directory, DEFAULT_MAX_CONCURRENT_JOBS, DEFAULT_PLATFORM};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{ConfigFile, EngineSettings, ExecutorSettings, LoggingSettings, StoreSettings};
