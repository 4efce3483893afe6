//! Run command - create a job and follow it to a terminal status.

use std::path::{Path, PathBuf};

use clap::Args;

use simforge::job::JobKind;

use super::jobs::{self, KindArg};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the run command.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Engine that will run the job
    #[arg(long, value_enum)]
    pub kind: KindArg,

    /// Path to a JSON object of engine parameters
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Run the run command.
pub async fn run(args: RunArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let runner = CliRunner::open(config_path)?;
    runner.log_startup("run");

    let job_config = jobs::job_config_from(args.config.as_deref())?;
    let kind = JobKind::from(args.kind);

    // Print banner
    println!("SimForge v{}", simforge::VERSION);
    println!("{}", "=".repeat(40));
    println!();
    println!("Engine:         {}", kind);
    println!(
        "Data directory: {}",
        runner.config().store.directory.display()
    );
    println!();

    let orchestrator = runner.open_orchestrator().await?;
    let id = orchestrator.create(kind, job_config).await;
    orchestrator.start(&id).await?;

    println!("Created {} job {}", kind, id);
    println!("Press Ctrl+C to request a cooperative stop.");
    println!();

    jobs::follow_to_completion(orchestrator, id).await
}
