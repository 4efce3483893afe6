//! Job progress counters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress of a job through its work units.
///
/// Units are engine-defined (MD steps, SCF iterations). Within a single run
/// the counters only move forward, and only the supervisor that owns the run
/// writes them. A restart resets progress to zero before new work begins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    /// Work units completed so far.
    pub completed_units: u64,
    /// Total work units planned for this run. Zero until the engine reports
    /// its plan during initialization.
    pub total_units: u64,
    /// Engine-reported phase label, if any (e.g. "minimization", "scf").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

impl JobProgress {
    /// Creates progress at zero with a known total.
    pub fn with_total(total_units: u64) -> Self {
        Self {
            completed_units: 0,
            total_units,
            phase: None,
        }
    }

    /// Adds completed units, saturating at the planned total when one is set.
    pub fn advance(&mut self, units: u64) {
        self.completed_units = self.completed_units.saturating_add(units);
        if self.total_units > 0 && self.completed_units > self.total_units {
            self.completed_units = self.total_units;
        }
    }

    /// Completed fraction in `[0.0, 1.0]`, or 0.0 while the total is unknown.
    pub fn fraction(&self) -> f64 {
        if self.total_units == 0 {
            0.0
        } else {
            self.completed_units as f64 / self.total_units as f64
        }
    }

    /// Returns true once every planned unit is done.
    pub fn is_complete(&self) -> bool {
        self.total_units > 0 && self.completed_units >= self.total_units
    }
}

impl fmt::Display for JobProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.phase {
            Some(phase) => write!(
                f,
                "{}/{} ({})",
                self.completed_units, self.total_units, phase
            ),
            None => write!(f, "{}/{}", self.completed_units, self.total_units),
        }
    }
}
