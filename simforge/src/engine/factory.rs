//! Engine wiring.

use super::electronic::ElectronicStructureEngine;
use super::molecular::MolecularDynamicsEngine;
use super::traits::ComputeEngine;
use crate::job::JobKind;
use std::collections::HashMap;
use std::sync::Arc;

/// Map from job kind to the engine that executes it.
pub type EngineMap = HashMap<JobKind, Arc<dyn ComputeEngine>>;

/// Builds the production engine set: molecular dynamics and electronic
/// structure. Tests swap in [`NullEngine`](super::NullEngine) instances
/// through the orchestrator instead.
pub fn default_engines() -> EngineMap {
    let mut engines: EngineMap = HashMap::new();
    engines.insert(
        JobKind::MolecularDynamics,
        Arc::new(MolecularDynamicsEngine::new()),
    );
    engines.insert(
        JobKind::ElectronicStructure,
        Arc::new(ElectronicStructureEngine::new()),
    );
    engines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engines_cover_every_kind() {
        let engines = default_engines();
        for kind in [JobKind::MolecularDynamics, JobKind::ElectronicStructure] {
            let engine = engines.get(&kind).unwrap();
            assert_eq!(engine.kind(), kind);
        }
    }

    #[test]
    fn test_engine_names() {
        let engines = default_engines();
        assert_eq!(engines[&JobKind::MolecularDynamics].name(), "md");
        assert_eq!(engines[&JobKind::ElectronicStructure].name(), "dft");
    }
}
