//! Electronic structure (DFT) engine.
//!
//! Deterministic stand-in for a self-consistent-field solver. Each work
//! unit is one SCF iteration; the energy correction shrinks geometrically
//! until it falls below the convergence threshold, at which point the run
//! is exhausted early. A run that spends its whole iteration budget
//! without converging still completes, with `converged: false` in the
//! results.

use super::traits::{ComputeEngine, EngineFuture, EngineRun};
use super::types::{self, ChunkOutcome, EngineError, RunSpec, SetupError};
use crate::job::JobKind;
use crate::store::OUTPUTS_DIR;
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_SCF_MAX_ITERATIONS: u64 = 50;
const DEFAULT_SCF_THRESHOLD_EV: f64 = 1e-6;
const DEFAULT_INITIAL_ENERGY_EV: f64 = -120.0;
const DEFAULT_LOG_FILE: &str = "scf.log";

// The first SCF correction, and the per-iteration shrink factor.
const FIRST_CORRECTION_EV: f64 = -2.5;
const CORRECTION_RATIO: f64 = 0.1;

/// Parsed and validated DFT parameters.
#[derive(Debug, Clone)]
struct DftParams {
    scf_max_iterations: u64,
    scf_threshold_ev: f64,
    initial_energy_ev: f64,
    log_file: String,
}

impl DftParams {
    fn from_spec(spec: &RunSpec) -> Result<Self, SetupError> {
        let config = &spec.config;

        let scf_max_iterations =
            types::u64_key(config, "scf_max_iterations", DEFAULT_SCF_MAX_ITERATIONS)?;
        if scf_max_iterations == 0 {
            return Err(SetupError::invalid(
                "scf_max_iterations",
                "must be at least one",
            ));
        }

        let scf_threshold_ev =
            types::f64_key(config, "scf_threshold_ev", DEFAULT_SCF_THRESHOLD_EV)?;
        if scf_threshold_ev < 0.0 {
            return Err(SetupError::invalid(
                "scf_threshold_ev",
                "must not be negative",
            ));
        }

        let initial_energy_ev =
            types::f64_key(config, "initial_energy_ev", DEFAULT_INITIAL_ENERGY_EV)?;

        let log_file = crate::store::sanitize_output_name(&types::str_key(
            config,
            "log_file",
            DEFAULT_LOG_FILE,
        )?);

        Ok(Self {
            scf_max_iterations,
            scf_threshold_ev,
            initial_energy_ev,
            log_file,
        })
    }
}

/// Stand-in DFT engine (job kind `dft`).
#[derive(Debug, Default)]
pub struct ElectronicStructureEngine;

impl ElectronicStructureEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ComputeEngine for ElectronicStructureEngine {
    fn kind(&self) -> JobKind {
        JobKind::ElectronicStructure
    }

    fn name(&self) -> &str {
        "dft"
    }

    fn prepare<'a>(
        &'a self,
        spec: &'a RunSpec,
    ) -> EngineFuture<'a, Result<Box<dyn EngineRun>, SetupError>> {
        Box::pin(async move {
            let params = DftParams::from_spec(spec)?;
            debug!(
                job_id = %spec.job_id,
                max_iterations = params.scf_max_iterations,
                threshold_ev = params.scf_threshold_ev,
                "Prepared electronic structure run"
            );
            let run = DftRun::create(params, spec.outputs_dir.clone())?;
            Ok(Box::new(run) as Box<dyn EngineRun>)
        })
    }
}

/// One in-flight SCF run.
struct DftRun {
    params: DftParams,
    outputs_dir: PathBuf,
    iteration: u64,
    energy_ev: f64,
    converged: bool,
}

impl DftRun {
    fn create(params: DftParams, outputs_dir: PathBuf) -> Result<Self, SetupError> {
        let energy_ev = params.initial_energy_ev;
        fs::write(
            outputs_dir.join(&params.log_file),
            format!("scf start  energy {:.8} eV\n", energy_ev),
        )?;
        Ok(Self {
            params,
            outputs_dir,
            iteration: 0,
            energy_ev,
            converged: false,
        })
    }

    /// Energy correction applied by iteration `i` (1-based).
    fn correction_at(&self, i: u64) -> f64 {
        FIRST_CORRECTION_EV * CORRECTION_RATIO.powi((i - 1) as i32)
    }
}

impl EngineRun for DftRun {
    fn total_units(&self) -> u64 {
        self.params.scf_max_iterations
    }

    fn phase(&self) -> &str {
        "scf"
    }

    fn run_chunk(&mut self, max_units: u64) -> EngineFuture<'_, Result<ChunkOutcome, EngineError>> {
        Box::pin(async move {
            if self.converged || self.iteration >= self.params.scf_max_iterations {
                return Ok(ChunkOutcome {
                    units_completed: 0,
                    exhausted: true,
                });
            }

            let mut lines = String::new();
            let mut units = 0;
            while units < max_units && self.iteration < self.params.scf_max_iterations {
                self.iteration += 1;
                units += 1;

                let correction = self.correction_at(self.iteration);
                self.energy_ev += correction;
                lines.push_str(&format!(
                    "iter {:>4}  energy {:.8} eV  delta {:.3e} eV\n",
                    self.iteration,
                    self.energy_ev,
                    correction.abs()
                ));

                if correction.abs() < self.params.scf_threshold_ev {
                    self.converged = true;
                    lines.push_str(&format!(
                        "scf converged after {} iterations\n",
                        self.iteration
                    ));
                    break;
                }
            }

            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.outputs_dir.join(&self.params.log_file))?;
            file.write_all(lines.as_bytes())?;

            let exhausted = self.converged || self.iteration >= self.params.scf_max_iterations;
            Ok(ChunkOutcome {
                units_completed: units,
                exhausted,
            })
        })
    }

    fn collect_results(&mut self) -> EngineFuture<'_, Result<serde_json::Value, EngineError>> {
        Box::pin(async move {
            Ok(json!({
                "final_energy_ev": (self.energy_ev * 1e6).round() / 1e6,
                "converged": self.converged,
                "iterations": self.iteration,
                "output_files": {
                    "log": format!("{}/{}", OUTPUTS_DIR, self.params.log_file),
                },
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobId;
    use serde_json::{json, Value};
    use std::path::Path;
    use tempfile::TempDir;

    fn spec_with(config: Value, outputs: &Path) -> RunSpec {
        RunSpec {
            job_id: JobId::new("dft-test"),
            config: config.as_object().unwrap().clone(),
            outputs_dir: outputs.to_path_buf(),
            default_platform: "auto".to_string(),
        }
    }

    async fn prepared(config: Value, outputs: &Path) -> Box<dyn EngineRun> {
        ElectronicStructureEngine::new()
            .prepare(&spec_with(config, outputs))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_prepare_rejects_zero_iterations() {
        let dir = TempDir::new().unwrap();
        let err = ElectronicStructureEngine::new()
            .prepare(&spec_with(json!({ "scf_max_iterations": 0 }), dir.path()))
            .await
            .err()
            .unwrap();
        assert!(
            matches!(err, SetupError::InvalidConfig { ref key, .. } if key == "scf_max_iterations")
        );
    }

    #[tokio::test]
    async fn test_defaults_converge_before_budget() {
        let dir = TempDir::new().unwrap();
        let mut run = prepared(json!({}), dir.path()).await;
        assert_eq!(run.total_units(), DEFAULT_SCF_MAX_ITERATIONS);
        assert_eq!(run.phase(), "scf");

        let outcome = run.run_chunk(1000).await.unwrap();
        assert!(outcome.exhausted);
        assert!(outcome.units_completed < DEFAULT_SCF_MAX_ITERATIONS);

        let results = run.collect_results().await.unwrap();
        assert_eq!(results["converged"], json!(true));
        assert_eq!(
            results["iterations"].as_u64().unwrap(),
            outcome.units_completed
        );
        let energy = results["final_energy_ev"].as_f64().unwrap();
        // Geometric series limit: -120 - 2.5 / (1 - 0.1)
        assert!((energy - (-122.777778)).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_impossible_threshold_exhausts_budget_unconverged() {
        let dir = TempDir::new().unwrap();
        let mut run = prepared(
            json!({ "scf_max_iterations": 12, "scf_threshold_ev": 0.0 }),
            dir.path(),
        )
        .await;

        let outcome = run.run_chunk(1000).await.unwrap();
        assert!(outcome.exhausted);
        assert_eq!(outcome.units_completed, 12);

        let results = run.collect_results().await.unwrap();
        assert_eq!(results["converged"], json!(false));
        assert_eq!(results["iterations"], json!(12));
    }

    #[tokio::test]
    async fn test_chunked_run_matches_single_chunk() {
        let dir_single = TempDir::new().unwrap();
        let mut single = prepared(json!({}), dir_single.path()).await;
        single.run_chunk(1000).await.unwrap();
        let single_results = single.collect_results().await.unwrap();

        let dir_chunked = TempDir::new().unwrap();
        let mut chunked = prepared(json!({}), dir_chunked.path()).await;
        loop {
            let outcome = chunked.run_chunk(3).await.unwrap();
            if outcome.exhausted {
                break;
            }
        }
        let chunked_results = chunked.collect_results().await.unwrap();

        assert_eq!(single_results, chunked_results);
    }

    #[tokio::test]
    async fn test_log_lines_track_iterations() {
        let dir = TempDir::new().unwrap();
        let mut run = prepared(json!({}), dir.path()).await;
        let outcome = run.run_chunk(1000).await.unwrap();

        let log = fs::read_to_string(dir.path().join("scf.log")).unwrap();
        // Start line + one line per iteration + the convergence line.
        assert_eq!(log.lines().count() as u64, 1 + outcome.units_completed + 1);
        assert!(log.contains("scf converged"));
    }

    #[tokio::test]
    async fn test_further_chunks_after_exhaustion_are_empty() {
        let dir = TempDir::new().unwrap();
        let mut run = prepared(json!({}), dir.path()).await;
        run.run_chunk(1000).await.unwrap();

        let again = run.run_chunk(10).await.unwrap();
        assert_eq!(again.units_completed, 0);
        assert!(again.exhausted);
    }
}
