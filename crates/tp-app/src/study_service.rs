//! Study loading, saving and validation.

use std::path::Path;

use tp_project::StudyDef;

use crate::compile::compile_study;
use crate::error::{AppError, AppResult};

/// What a valid study looks like once its tables are read.
#[derive(Debug, Clone)]
pub struct StudyReport {
    pub name: String,
    pub table_reaches: usize,
    pub network_reaches: usize,
    pub outlet_count: usize,
    pub variants: Vec<String>,
    pub removal_factor_rows: usize,
    pub inundation_comparison: bool,
}

/// Load a study file (YAML, or JSON by extension).
pub fn load_study(path: &Path) -> AppResult<StudyDef> {
    Ok(tp_project::load_study(path)?)
}

/// Save a study file, choosing the format by extension.
pub fn save_study(path: &Path, study: &StudyDef) -> AppResult<()> {
    let result = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => tp_project::save_json(path, study),
        _ => tp_project::save_yaml(path, study),
    };
    result.map_err(|err| match err {
        tp_project::ProjectError::Io(source) => AppError::StudyFileWrite {
            path: path.to_path_buf(),
            source,
        },
        other => other.into(),
    })
}

/// Load a study and its tables, then compile it without running anything.
pub fn validate_study_file(path: &Path) -> AppResult<StudyReport> {
    let study = load_study(path)?;
    let inputs = tp_project::load_inputs(&study, path)?;
    let removal_factor_rows = inputs.removal_factors.len();
    let compiled = compile_study(&study, inputs)?;

    Ok(StudyReport {
        name: study.name.clone(),
        table_reaches: compiled.store.len(),
        network_reaches: compiled.network.len(),
        outlet_count: compiled.network.outlets().len(),
        variants: compiled.config.variants.clone(),
        removal_factor_rows,
        inundation_comparison: compiled.config.pre_inundation,
    })
}
