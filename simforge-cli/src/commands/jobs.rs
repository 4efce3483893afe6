//! Job lifecycle and inspection commands.
//!
//! One handler per subcommand. Commands that leave a job running in this
//! process (`start`, `resume`, and `run` via [`follow_to_completion`]) wait
//! for a terminal status and translate Ctrl-C into a cooperative stop.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use serde_json::{Map, Value};
use tracing::info;

use simforge::job::{JobId, JobKind, JobRecord, JobStatus};
use simforge::orchestrator::{Orchestrator, OrchestratorError};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Job kind selector for `--kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Molecular dynamics trajectory
    Md,
    /// Electronic structure (DFT self-consistent field)
    Dft,
}

impl From<KindArg> for JobKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Md => JobKind::MolecularDynamics,
            KindArg::Dft => JobKind::ElectronicStructure,
        }
    }
}

/// Arguments for the submit command.
#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Engine that will run the job
    #[arg(long, value_enum)]
    pub kind: KindArg,

    /// Path to a JSON object of engine parameters
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Run the submit command.
pub async fn submit(args: SubmitArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let runner = CliRunner::open(config_path)?;
    runner.log_startup("submit");

    let job_config = job_config_from(args.config.as_deref())?;
    let orchestrator = runner.open_orchestrator().await?;

    let kind = JobKind::from(args.kind);
    let id = orchestrator.create(kind, job_config).await;
    println!("Created {} job {}", kind, id);
    println!("Start it with: simforge start {}", id);

    Ok(())
}

/// Run the start command.
pub async fn start(id: &str, config_path: Option<&Path>) -> Result<(), CliError> {
    let runner = CliRunner::open(config_path)?;
    runner.log_startup("start");
    let orchestrator = runner.open_orchestrator().await?;

    let id = JobId::from(id);
    orchestrator.start(&id).await?;
    let record = orchestrator.record(&id).await?;
    println!("Started {} job {}", record.kind, id);
    println!("Press Ctrl+C to request a cooperative stop.");
    println!();

    follow_to_completion(orchestrator, id).await
}

/// Run the list command.
pub async fn list(config_path: Option<&Path>) -> Result<(), CliError> {
    let runner = CliRunner::open(config_path)?;
    runner.log_startup("list");
    let orchestrator = runner.open_orchestrator().await?;

    let jobs = orchestrator.list().await;
    if jobs.is_empty() {
        println!("No jobs found.");
        println!("Create one with: simforge run --kind md --config params.json");
        return Ok(());
    }

    println!("Jobs ({})", jobs.len());
    println!();
    println!(
        "{:<36}  {:<4}  {:<12}  {}",
        "ID", "KIND", "STATUS", "PROGRESS"
    );
    for job in &jobs {
        println!(
            "{:<36}  {:<4}  {:<12}  {}",
            job.id.to_string(),
            job.kind.to_string(),
            job.status.to_string(),
            job.progress
        );
    }

    Ok(())
}

/// Run the status command.
pub async fn status(id: &str, config_path: Option<&Path>) -> Result<(), CliError> {
    let runner = CliRunner::open(config_path)?;
    runner.log_startup("status");
    let orchestrator = runner.open_orchestrator().await?;

    let record = orchestrator.record(&JobId::from(id)).await?;
    print_record(&record);

    Ok(())
}

/// Run the results command.
pub async fn results(id: &str, config_path: Option<&Path>) -> Result<(), CliError> {
    let runner = CliRunner::open(config_path)?;
    runner.log_startup("results");
    let orchestrator = runner.open_orchestrator().await?;

    let value = orchestrator.results(&JobId::from(id)).await?;
    println!("{:#}", value);

    Ok(())
}

/// Run the resume command.
///
/// A paused record whose original process is gone starts over as a fresh
/// run; this process then follows it the same way `start` does.
pub async fn resume(id: &str, config_path: Option<&Path>) -> Result<(), CliError> {
    let runner = CliRunner::open(config_path)?;
    runner.log_startup("resume");
    let orchestrator = runner.open_orchestrator().await?;

    let id = JobId::from(id);
    orchestrator.resume(&id).await?;
    let record = orchestrator.record(&id).await?;
    println!("Resuming {} job {}", record.kind, id);
    println!("Press Ctrl+C to request a cooperative stop.");
    println!();

    follow_to_completion(orchestrator, id).await
}

/// Run the stop command.
///
/// In a fresh process there is no live run to signal; this finalizes
/// records left active by an earlier process.
pub async fn stop(id: &str, config_path: Option<&Path>) -> Result<(), CliError> {
    let runner = CliRunner::open(config_path)?;
    runner.log_startup("stop");
    let orchestrator = runner.open_orchestrator().await?;

    let id = JobId::from(id);
    orchestrator.stop(&id).await?;
    let record = orchestrator.record(&id).await?;
    println!("Job {} is {} at {}", id, record.status, record.progress);

    Ok(())
}

/// Run the delete command.
pub async fn delete(id: &str, config_path: Option<&Path>) -> Result<(), CliError> {
    let runner = CliRunner::open(config_path)?;
    runner.log_startup("delete");
    let orchestrator = runner.open_orchestrator().await?;

    let id = JobId::from(id);
    orchestrator.delete(&id).await?;
    println!("Deleted job {}", id);

    Ok(())
}

/// Follow a started job to a terminal status, honoring Ctrl-C.
///
/// Ctrl-C requests a cooperative stop and waits for the supervisor to
/// finalize the record. A job that finishes `failed` becomes the process
/// exit status.
pub async fn follow_to_completion(orchestrator: Orchestrator, id: JobId) -> Result<(), CliError> {
    let status = tokio::select! {
        status = orchestrator.wait(&id) => status?,
        _ = interrupted() => {
            println!();
            println!("Stopping job {}...", id);
            match orchestrator.stop(&id).await {
                Ok(()) => {}
                // The run can reach a terminal status on its own between
                // the signal and the stop call.
                Err(OrchestratorError::InvalidTransition { .. }) => {}
                Err(e) => return Err(e.into()),
            }
            orchestrator.wait(&id).await?
        }
    };

    let record = orchestrator.record(&id).await?;
    orchestrator.shutdown().await;
    info!(job_id = %id, status = %status, "Run finished");

    match status {
        JobStatus::Completed => {
            println!(
                "Job {} completed: {} units",
                id, record.progress.completed_units
            );
            if let Some(ref result) = record.result {
                println!();
                println!("{:#}", result);
            }
            Ok(())
        }
        JobStatus::Stopped => {
            println!("Job {} stopped at {}", id, record.progress);
            println!("Restart it with: simforge start {}", id);
            Ok(())
        }
        JobStatus::Failed => Err(CliError::JobFailed {
            id: id.to_string(),
            error: record
                .error
                .unwrap_or_else(|| "unknown engine fault".to_string()),
        }),
        other => {
            println!("Job {} finished as {}", id, other);
            Ok(())
        }
    }
}

/// Load engine parameters from a JSON file, or an empty map without one.
pub fn job_config_from(path: Option<&Path>) -> Result<Map<String, Value>, CliError> {
    match path {
        Some(path) => read_job_config(path),
        None => Ok(Map::new()),
    }
}

/// Load engine parameters from a JSON file.
///
/// The file must hold a single JSON object; its fields pass through to the
/// engine untouched.
fn read_job_config(path: &Path) -> Result<Map<String, Value>, CliError> {
    let text = fs::read_to_string(path).map_err(|e| CliError::JobConfigRead {
        path: path.display().to_string(),
        error: e,
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|e| CliError::JobConfigParse {
        path: path.display().to_string(),
        error: e,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(CliError::Config(format!(
            "Job config '{}' must be a JSON object",
            path.display()
        ))),
    }
}

/// Print the full record view used by the status command.
fn print_record(record: &JobRecord) {
    println!("Job:      {}", record.id);
    println!("Kind:     {}", record.kind);
    println!("Status:   {}", record.status);
    println!("Progress: {}", record.progress);
    println!(
        "Created:  {}",
        record.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "Updated:  {}",
        record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(ref error) = record.error {
        println!("Error:    {}", error);
    }
    if record.status == JobStatus::Completed {
        println!();
        println!("Fetch results with: simforge results {}", record.id);
    }
}

/// Resolves when the user sends Ctrl-C.
///
/// If the signal handler cannot be installed this parks forever so the
/// run's own outcome decides.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
