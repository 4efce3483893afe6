//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (get, set, list, path)
//! - [`jobs`] - Job lifecycle and inspection (submit, start, list, status,
//!   results, resume, stop, delete)
//! - [`run`] - Main command (create a job and follow it to completion)

pub mod config;
pub mod jobs;
pub mod run;
