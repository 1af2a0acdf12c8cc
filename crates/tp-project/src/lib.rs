//! tp-project: study file format, validation and input tables.

pub mod schema;
pub mod tables;
pub mod validate;

use std::path::{Path, PathBuf};

pub use schema::*;
pub use tables::{ColumnMap, EdgeRow};
pub use validate::{LATEST_VERSION, RESERVED_SCENARIO_IDS, ValidationError, validate_study};

use tp_core::ReachAttributes;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Table '{table}' line {line}: invalid value '{value}' in column '{column}'")]
    InvalidCell {
        table: String,
        line: u64,
        column: String,
        value: String,
    },
}

pub fn load_yaml(path: &Path) -> ProjectResult<StudyDef> {
    let content = std::fs::read_to_string(path)?;
    let study: StudyDef = serde_yaml::from_str(&content)?;
    validate_study(&study)?;
    Ok(study)
}

pub fn save_yaml(path: &Path, study: &StudyDef) -> ProjectResult<()> {
    validate_study(study)?;
    let content = serde_yaml::to_string(study)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<StudyDef> {
    let content = std::fs::read_to_string(path)?;
    let study: StudyDef = serde_json::from_str(&content)?;
    validate_study(&study)?;
    Ok(study)
}

pub fn save_json(path: &Path, study: &StudyDef) -> ProjectResult<()> {
    validate_study(study)?;
    let content = serde_json::to_string_pretty(study)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load a study file, choosing JSON for `.json` and YAML otherwise.
pub fn load_study(path: &Path) -> ProjectResult<StudyDef> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_json(path),
        _ => load_yaml(path),
    }
}

/// Raw input tables of a study, read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyInputs {
    pub reaches: Vec<ReachAttributes>,
    pub edges: Vec<EdgeRow>,
    /// Inline rows followed by rows from the removal factor table, if any.
    pub removal_factors: Vec<RemovalFactorDef>,
    /// Resolved file paths, in the order reaches, edges, removal factors.
    pub files: Vec<PathBuf>,
}

/// Resolve `inputs` relative to the study file's directory and read them.
pub fn load_inputs(study: &StudyDef, study_path: &Path) -> ProjectResult<StudyInputs> {
    let base = study_path.parent().unwrap_or_else(|| Path::new("."));
    let reaches_path = base.join(&study.inputs.reaches);
    let edges_path = base.join(&study.inputs.edges);

    let reaches = tables::load_reaches(&reaches_path, &study.coverage_variants)?;
    let edges = tables::load_edges(&edges_path)?;
    let mut files = vec![reaches_path, edges_path];

    let mut removal_factors = study.removal_factors.clone();
    if let Some(rel) = &study.inputs.removal_factors {
        let path = base.join(rel);
        removal_factors.extend(tables::load_removal_factors(&path)?);
        files.push(path);
    }
    validate::validate_removal_factors(&removal_factors)?;

    Ok(StudyInputs {
        reaches,
        edges,
        removal_factors,
        files,
    })
}
