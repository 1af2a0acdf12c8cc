//! Shared application service layer for tpload.
//!
//! This crate is the single entry point for frontends: it loads and
//! validates studies, compiles them into an immutable pipeline
//! configuration, runs the mitigation and routing pipeline, caches runs
//! and answers queries about stored results.

pub mod compile;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod run_service;
pub mod study_service;

pub use compile::{CompiledStudy, PipelineConfig, build_network, compile_config, compile_study};
pub use error::{AppError, AppResult};
pub use pipeline::{BASELINE, PRE_INUNDATION, PipelineOutput, run_pipeline, scenario_names};
pub use progress::{RunProgressEvent, RunStage};
pub use query::{
    RunSummary, export_run, get_run_summary, largest_reductions, list_scenarios, reach_records,
    scenario_records,
};
pub use run_service::{
    ENGINE_VERSION, RunOptions, RunRequest, RunResponse, RunTimingSummary, ensure_run,
    ensure_run_with_progress, list_runs, load_run, load_run_diagnostics,
};
pub use study_service::{StudyReport, load_study, save_study, validate_study_file};
pub use tp_results::{DiagnosticsReport, ReachScenarioRecord, RunManifest};
