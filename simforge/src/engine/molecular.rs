//! Molecular dynamics engine.
//!
//! Deterministic stand-in for an MD integrator. It models an NVT run:
//! optional energy minimization, then `steps` of Langevin dynamics with a
//! relaxing potential energy, writing a state-data CSV and a binary
//! trajectory at every report interval. Work units are integration steps.

use super::traits::{ComputeEngine, EngineFuture, EngineRun};
use super::types::{self, CheckpointBlob, ChunkOutcome, EngineError, RunSpec, SetupError};
use crate::job::JobKind;
use crate::store::OUTPUTS_DIR;
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

// Defaults for an NVT setup: 2 fs timestep, Langevin thermostat at 300 K
// with 1/ps friction.
const DEFAULT_TIMESTEP_PS: f64 = 0.002;
const DEFAULT_TEMPERATURE_K: f64 = 300.0;
const DEFAULT_FRICTION_INV_PS: f64 = 1.0;
const DEFAULT_REPORT_INTERVAL: u64 = 100;
const DEFAULT_MINIMIZE_MAX_ITERATIONS: u64 = 100;
const DEFAULT_TRAJECTORY_FILE: &str = "trajectory.dcd";
const DEFAULT_STATE_DATA_FILE: &str = "state.csv";
const DEFAULT_CHECKPOINT_FILE: &str = "checkpoint.chk";

/// Platform names the integrator accepts (case-insensitive).
const PLATFORMS: [&str; 5] = ["auto", "cpu", "cuda", "opencl", "reference"];

const STATE_DATA_HEADER: &str = "step,potential_energy_kj_mol,temperature_k\n";

// Energy model: the system starts in a shallow basin, minimization deepens
// it, and dynamics relaxes the potential toward a thermal plateau.
const BASE_POTENTIAL_KJ_MOL: f64 = -1200.0;
const MINIMIZATION_DROP_KJ_MOL: f64 = -150.0;
const THERMAL_RISE_KJ_MOL: f64 = 40.0;

/// Parsed and validated MD parameters.
#[derive(Debug, Clone)]
struct MdParams {
    steps: u64,
    timestep_ps: f64,
    temperature_k: f64,
    friction_inv_ps: f64,
    platform: String,
    minimize_energy: bool,
    minimize_max_iterations: u64,
    report_interval: u64,
    trajectory_file: String,
    state_data_file: String,
    checkpoint_file: String,
}

impl MdParams {
    fn from_spec(spec: &RunSpec) -> Result<Self, SetupError> {
        let config = &spec.config;

        let steps = types::required_u64(config, "steps")?;
        if steps == 0 {
            return Err(SetupError::invalid("steps", "must be greater than zero"));
        }

        let timestep_ps = types::f64_key(config, "timestep_ps", DEFAULT_TIMESTEP_PS)?;
        if timestep_ps <= 0.0 {
            return Err(SetupError::invalid("timestep_ps", "must be positive"));
        }

        let temperature_k = types::f64_key(config, "temperature_k", DEFAULT_TEMPERATURE_K)?;
        if temperature_k < 0.0 {
            return Err(SetupError::invalid("temperature_k", "must not be negative"));
        }

        let friction_inv_ps = types::f64_key(config, "friction_inv_ps", DEFAULT_FRICTION_INV_PS)?;
        if friction_inv_ps < 0.0 {
            return Err(SetupError::invalid("friction_inv_ps", "must not be negative"));
        }

        let report_interval = types::u64_key(config, "report_interval", DEFAULT_REPORT_INTERVAL)?;
        if report_interval == 0 {
            return Err(SetupError::invalid("report_interval", "must be at least one"));
        }

        let minimize_energy = types::bool_key(config, "minimize_energy", false)?;
        let minimize_max_iterations = types::u64_key(
            config,
            "minimize_max_iterations",
            DEFAULT_MINIMIZE_MAX_ITERATIONS,
        )?;
        if minimize_energy && minimize_max_iterations == 0 {
            return Err(SetupError::invalid(
                "minimize_max_iterations",
                "must be at least one when minimize_energy is set",
            ));
        }

        let platform = types::str_key(config, "platform", &spec.default_platform)?.to_lowercase();
        if !PLATFORMS.contains(&platform.as_str()) {
            return Err(SetupError::PlatformUnavailable(platform));
        }

        let trajectory_file = crate::store::sanitize_output_name(&types::str_key(
            config,
            "trajectory_file",
            DEFAULT_TRAJECTORY_FILE,
        )?);
        let state_data_file = crate::store::sanitize_output_name(&types::str_key(
            config,
            "state_data_file",
            DEFAULT_STATE_DATA_FILE,
        )?);
        let checkpoint_file = crate::store::sanitize_output_name(&types::str_key(
            config,
            "checkpoint_file",
            DEFAULT_CHECKPOINT_FILE,
        )?);

        Ok(Self {
            steps,
            timestep_ps,
            temperature_k,
            friction_inv_ps,
            platform,
            minimize_energy,
            minimize_max_iterations,
            report_interval,
            trajectory_file,
            state_data_file,
            checkpoint_file,
        })
    }
}

/// Stand-in molecular dynamics engine (job kind `md`).
#[derive(Debug, Default)]
pub struct MolecularDynamicsEngine;

impl MolecularDynamicsEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ComputeEngine for MolecularDynamicsEngine {
    fn kind(&self) -> JobKind {
        JobKind::MolecularDynamics
    }

    fn name(&self) -> &str {
        "md"
    }

    fn prepare<'a>(
        &'a self,
        spec: &'a RunSpec,
    ) -> EngineFuture<'a, Result<Box<dyn EngineRun>, SetupError>> {
        Box::pin(async move {
            let params = MdParams::from_spec(spec)?;
            debug!(
                job_id = %spec.job_id,
                steps = params.steps,
                platform = %params.platform,
                minimize = params.minimize_energy,
                "Prepared molecular dynamics run"
            );
            let run = MdRun::create(params, spec.outputs_dir.clone())?;
            Ok(Box::new(run) as Box<dyn EngineRun>)
        })
    }
}

/// One in-flight MD run.
struct MdRun {
    params: MdParams,
    outputs_dir: PathBuf,
    step: u64,
    minimized_drop_kj_mol: f64,
    phase: &'static str,
    checkpoints_taken: u64,
}

impl MdRun {
    fn create(params: MdParams, outputs_dir: PathBuf) -> Result<Self, SetupError> {
        // A restart overwrites artifacts from any previous run.
        fs::write(
            outputs_dir.join(&params.state_data_file),
            STATE_DATA_HEADER,
        )?;
        fs::write(outputs_dir.join(&params.trajectory_file), b"")?;

        let phase = if params.minimize_energy {
            "minimization"
        } else {
            "dynamics"
        };
        Ok(Self {
            params,
            outputs_dir,
            step: 0,
            minimized_drop_kj_mol: 0.0,
            phase,
            checkpoints_taken: 0,
        })
    }

    fn potential_energy_at(&self, step: u64) -> f64 {
        let tau = (self.params.steps as f64 / 4.0).max(1.0);
        let base = BASE_POTENTIAL_KJ_MOL + self.minimized_drop_kj_mol;
        base + THERMAL_RISE_KJ_MOL * (1.0 - (-(step as f64) / tau).exp())
    }

    fn temperature_at(&self, step: u64) -> f64 {
        let tau = (self.params.steps as f64 / 8.0).max(1.0);
        self.params.temperature_k * (1.0 - (-(step as f64) / tau).exp())
    }

    fn append(&self, file_name: &str, bytes: &[u8]) -> Result<(), EngineError> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.outputs_dir.join(file_name))?;
        file.write_all(bytes)?;
        Ok(())
    }
}

impl EngineRun for MdRun {
    fn total_units(&self) -> u64 {
        self.params.steps
    }

    fn phase(&self) -> &str {
        self.phase
    }

    fn warm_up(&mut self) -> EngineFuture<'_, Result<(), EngineError>> {
        Box::pin(async move {
            if self.params.minimize_energy {
                // Closed-form relaxation over the iteration budget; deeper
                // budgets approach the full basin depth.
                let iters = self.params.minimize_max_iterations as f64;
                self.minimized_drop_kj_mol =
                    MINIMIZATION_DROP_KJ_MOL * (1.0 - (-iters / 50.0).exp());
                debug!(
                    iterations = self.params.minimize_max_iterations,
                    drop_kj_mol = self.minimized_drop_kj_mol,
                    "Energy minimization finished"
                );
            }
            self.phase = "dynamics";
            Ok(())
        })
    }

    fn run_chunk(&mut self, max_units: u64) -> EngineFuture<'_, Result<ChunkOutcome, EngineError>> {
        Box::pin(async move {
            let remaining = self.params.steps.saturating_sub(self.step);
            let units = remaining.min(max_units);
            if units == 0 {
                return Ok(ChunkOutcome {
                    units_completed: 0,
                    exhausted: true,
                });
            }

            let mut rows = String::new();
            let mut frames = Vec::new();
            for step in (self.step + 1)..=(self.step + units) {
                if step % self.params.report_interval == 0 {
                    let energy = self.potential_energy_at(step);
                    rows.push_str(&format!(
                        "{},{:.3},{:.2}\n",
                        step,
                        energy,
                        self.temperature_at(step)
                    ));
                    frames.extend_from_slice(&step.to_le_bytes());
                    frames.extend_from_slice(&energy.to_le_bytes());
                }
            }
            self.step += units;

            if !rows.is_empty() {
                self.append(&self.params.state_data_file, rows.as_bytes())?;
                self.append(&self.params.trajectory_file, &frames)?;
            }

            Ok(ChunkOutcome {
                units_completed: units,
                exhausted: self.step >= self.params.steps,
            })
        })
    }

    fn checkpoint(&mut self) -> EngineFuture<'_, Result<Option<CheckpointBlob>, EngineError>> {
        Box::pin(async move {
            let payload = json!({
                "step": self.step,
                "potential_energy_kj_mol": round3(self.potential_energy_at(self.step)),
                "temperature_k": round2(self.temperature_at(self.step)),
                "timestep_ps": self.params.timestep_ps,
                "friction_inv_ps": self.params.friction_inv_ps,
            });
            let bytes = serde_json::to_vec_pretty(&payload)
                .map_err(|e| EngineError::Checkpoint(e.to_string()))?;
            self.checkpoints_taken += 1;
            Ok(Some(CheckpointBlob {
                file_name: self.params.checkpoint_file.clone(),
                bytes,
            }))
        })
    }

    fn collect_results(&mut self) -> EngineFuture<'_, Result<serde_json::Value, EngineError>> {
        Box::pin(async move {
            let mut output_files = json!({
                "trajectory": format!("{}/{}", OUTPUTS_DIR, self.params.trajectory_file),
                "state_data": format!("{}/{}", OUTPUTS_DIR, self.params.state_data_file),
            });
            if self.checkpoints_taken > 0 {
                output_files["checkpoint"] =
                    json!(format!("{}/{}", OUTPUTS_DIR, self.params.checkpoint_file));
            }
            Ok(json!({
                "steps_completed": self.step,
                "final_potential_energy_kj_mol": round3(self.potential_energy_at(self.step)),
                "final_temperature_k": round2(self.temperature_at(self.step)),
                "output_files": output_files,
            }))
        })
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
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
            job_id: JobId::new("md-test"),
            config: config.as_object().unwrap().clone(),
            outputs_dir: outputs.to_path_buf(),
            default_platform: "auto".to_string(),
        }
    }

    async fn prepared(config: Value, outputs: &Path) -> Box<dyn EngineRun> {
        MolecularDynamicsEngine::new()
            .prepare(&spec_with(config, outputs))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_prepare_rejects_missing_steps() {
        let dir = TempDir::new().unwrap();
        let err = MolecularDynamicsEngine::new()
            .prepare(&spec_with(json!({}), dir.path()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SetupError::InvalidConfig { ref key, .. } if key == "steps"));
    }

    #[tokio::test]
    async fn test_prepare_rejects_zero_steps() {
        let dir = TempDir::new().unwrap();
        let err = MolecularDynamicsEngine::new()
            .prepare(&spec_with(json!({ "steps": 0 }), dir.path()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SetupError::InvalidConfig { ref key, .. } if key == "steps"));
    }

    #[tokio::test]
    async fn test_prepare_rejects_unknown_platform() {
        let dir = TempDir::new().unwrap();
        let err = MolecularDynamicsEngine::new()
            .prepare(&spec_with(
                json!({ "steps": 10, "platform": "quantum" }),
                dir.path(),
            ))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SetupError::PlatformUnavailable(ref p) if p == "quantum"));
    }

    #[tokio::test]
    async fn test_prepare_applies_defaults() {
        let dir = TempDir::new().unwrap();
        let run = prepared(json!({ "steps": 50 }), dir.path()).await;
        assert_eq!(run.total_units(), 50);
        // No minimization requested, so the run starts in dynamics.
        assert_eq!(run.phase(), "dynamics");
        assert!(dir.path().join("state.csv").is_file());
        assert!(dir.path().join("trajectory.dcd").is_file());
    }

    #[tokio::test]
    async fn test_run_reports_at_interval_and_exhausts() {
        let dir = TempDir::new().unwrap();
        let mut run = prepared(json!({ "steps": 10, "report_interval": 2 }), dir.path()).await;
        run.warm_up().await.unwrap();

        let first = run.run_chunk(4).await.unwrap();
        assert_eq!(first.units_completed, 4);
        assert!(!first.exhausted);

        let second = run.run_chunk(4).await.unwrap();
        assert_eq!(second.units_completed, 4);
        assert!(!second.exhausted);

        let third = run.run_chunk(4).await.unwrap();
        assert_eq!(third.units_completed, 2);
        assert!(third.exhausted);

        // Reports at steps 2, 4, 6, 8, 10 on top of the header row.
        let csv = fs::read_to_string(dir.path().join("state.csv")).unwrap();
        assert_eq!(csv.lines().count(), 6);
        assert!(csv.starts_with("step,"));

        // One 16-byte frame per report.
        let trajectory = fs::read(dir.path().join("trajectory.dcd")).unwrap();
        assert_eq!(trajectory.len(), 5 * 16);
    }

    #[tokio::test]
    async fn test_minimization_lowers_final_energy() {
        let dir_plain = TempDir::new().unwrap();
        let mut plain = prepared(json!({ "steps": 20 }), dir_plain.path()).await;
        plain.warm_up().await.unwrap();
        plain.run_chunk(20).await.unwrap();
        let plain_results = plain.collect_results().await.unwrap();

        let dir_min = TempDir::new().unwrap();
        let mut minimized = prepared(
            json!({ "steps": 20, "minimize_energy": true }),
            dir_min.path(),
        )
        .await;
        assert_eq!(minimized.phase(), "minimization");
        minimized.warm_up().await.unwrap();
        assert_eq!(minimized.phase(), "dynamics");
        minimized.run_chunk(20).await.unwrap();
        let min_results = minimized.collect_results().await.unwrap();

        let plain_energy = plain_results["final_potential_energy_kj_mol"]
            .as_f64()
            .unwrap();
        let min_energy = min_results["final_potential_energy_kj_mol"]
            .as_f64()
            .unwrap();
        assert!(min_energy < plain_energy);
    }

    #[tokio::test]
    async fn test_checkpoint_blob_uses_configured_name() {
        let dir = TempDir::new().unwrap();
        let mut run = prepared(
            json!({ "steps": 10, "checkpoint_file": "restart.chk" }),
            dir.path(),
        )
        .await;
        run.run_chunk(5).await.unwrap();

        let blob = run.checkpoint().await.unwrap().unwrap();
        assert_eq!(blob.file_name, "restart.chk");
        let payload: Value = serde_json::from_slice(&blob.bytes).unwrap();
        assert_eq!(payload["step"], json!(5));
    }

    #[tokio::test]
    async fn test_results_list_output_files() {
        let dir = TempDir::new().unwrap();
        let mut run = prepared(json!({ "steps": 10 }), dir.path()).await;
        run.warm_up().await.unwrap();
        let outcome = run.run_chunk(100).await.unwrap();
        assert!(outcome.exhausted);

        let results = run.collect_results().await.unwrap();
        assert_eq!(results["steps_completed"], json!(10));
        assert_eq!(
            results["output_files"]["trajectory"],
            json!("outputs/trajectory.dcd")
        );
        assert_eq!(
            results["output_files"]["state_data"],
            json!("outputs/state.csv")
        );
        // No checkpoint was requested during this run.
        assert!(results["output_files"].get("checkpoint").is_none());
    }

    #[tokio::test]
    async fn test_output_names_are_sanitized() {
        let dir = TempDir::new().unwrap();
        let run = prepared(
            json!({ "steps": 10, "state_data_file": "../escape/state.csv" }),
            dir.path(),
        )
        .await;
        drop(run);
        assert!(dir.path().join("state.csv").is_file());
        assert!(!dir.path().join("..").join("escape").exists());
    }
}
