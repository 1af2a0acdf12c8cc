//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};
use tp_project::{InputsDef, StudyDef, StudyInputs};

/// Run id over the study definition, the input table contents and the
/// engine version. File locations do not take part.
pub fn compute_run_id(study: &StudyDef, inputs: &StudyInputs, engine_version: &str) -> String {
    let mut hasher = Sha256::new();

    let mut study = study.clone();
    study.inputs = InputsDef::default();
    let study_json = serde_json::to_string(&study).unwrap_or_default();
    hasher.update(study_json.as_bytes());

    let reaches_json = serde_json::to_string(&inputs.reaches).unwrap_or_default();
    hasher.update(reaches_json.as_bytes());

    let edges_json = serde_json::to_string(&inputs.edges).unwrap_or_default();
    hasher.update(edges_json.as_bytes());

    let factors_json = serde_json::to_string(&inputs.removal_factors).unwrap_or_default();
    hasher.update(factors_json.as_bytes());

    hasher.update(engine_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}
