//! SimForge CLI - Command-line interface
//!
//! This binary provides a command-line interface to the simforge library.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::jobs::{self, SubmitArgs};
use commands::run::{self, RunArgs};

#[derive(Parser)]
#[command(name = "simforge")]
#[command(version)]
#[command(
    about = "Orchestrate long-running scientific computation jobs",
    long_about = None
)]
struct Cli {
    /// Use an alternate config file instead of ~/.simforge/config.ini
    #[arg(long, global = true, value_name = "FILE")]
    config_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a job and run it to a terminal status
    Run(RunArgs),

    /// Create a job without starting it
    Submit(SubmitArgs),

    /// Start a pending, stopped, or interrupted job and follow it
    Start {
        /// Job ID
        id: String,
    },

    /// List all known jobs
    List,

    /// Show one job's record
    Status {
        /// Job ID
        id: String,
    },

    /// Print a completed job's result document
    Results {
        /// Job ID
        id: String,
    },

    /// Resume a paused job and follow it
    Resume {
        /// Job ID
        id: String,
    },

    /// Stop a job left active by an earlier process
    Stop {
        /// Job ID
        id: String,
    },

    /// Stop a job if needed and remove all its artifacts
    Delete {
        /// Job ID
        id: String,
    },

    /// View and modify configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let Cli {
        config_path,
        command,
    } = Cli::parse();
    let config_path = config_path.as_deref();

    let result = match command {
        Commands::Run(args) => run::run(args, config_path).await,
        Commands::Submit(args) => jobs::submit(args, config_path).await,
        Commands::Start { id } => jobs::start(&id, config_path).await,
        Commands::List => jobs::list(config_path).await,
        Commands::Status { id } => jobs::status(&id, config_path).await,
        Commands::Results { id } => jobs::results(&id, config_path).await,
        Commands::Resume { id } => jobs::resume(&id, config_path).await,
        Commands::Stop { id } => jobs::stop(&id, config_path).await,
        Commands::Delete { id } => jobs::delete(&id, config_path).await,
        Commands::Config { command } => commands::config::run(command, config_path),
    };

    if let Err(e) = result {
        e.exit();
    }
}
