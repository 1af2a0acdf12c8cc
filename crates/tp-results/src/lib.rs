//! tp-results: scenario comparison, result checks and the run store.

pub mod checks;
pub mod compare;
pub mod export;
pub mod hash;
pub mod store;
pub mod types;

pub use checks::check_against_baseline;
pub use compare::{ComparisonSummary, ReachReduction, ScenarioComparator};
pub use export::write_records_csv;
pub use hash::compute_run_id;
pub use store::RunStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },
}
