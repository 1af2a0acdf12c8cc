//! Run execution and caching service.

use std::path::Path;
use std::time::Instant;

use tracing::info;

use tp_results::{
    DiagnosticsReport, ReachScenarioRecord, RunManifest, RunStore, compute_run_id,
    counts_to_manifest,
};

use crate::compile::compile_study;
use crate::error::{AppError, AppResult};
use crate::pipeline::run_pipeline;
use crate::progress::{RunProgressEvent, RunStage};
use crate::study_service;

/// Version recorded in manifests and mixed into run ids.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Options for executing a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub engine_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            engine_version: ENGINE_VERSION.to_string(),
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub study_path: &'a Path,
    pub options: RunOptions,
}

#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub load_inputs_time_s: f64,
    pub compile_time_s: f64,
    pub pipeline_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub run_id: String,
    pub manifest: RunManifest,
    pub loaded_from_cache: bool,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent::stage(
            stage,
            started.elapsed().as_secs_f64(),
            message,
        ));
    }
}

/// Execute a run or load it from cache.
pub fn ensure_run(request: &RunRequest) -> AppResult<RunResponse> {
    ensure_run_with_progress(request, None)
}

/// Execute a run or load it from cache, reporting each stage.
pub fn ensure_run_with_progress(
    request: &RunRequest,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<RunResponse> {
    let started = Instant::now();
    let mut timing = RunTimingSummary::default();

    emit_progress(&mut progress_cb, RunStage::LoadingStudy, started, None);
    let study = study_service::load_study(request.study_path)?;

    emit_progress(&mut progress_cb, RunStage::LoadingInputs, started, None);
    let load_started = Instant::now();
    let inputs = tp_project::load_inputs(&study, request.study_path)?;
    timing.load_inputs_time_s = load_started.elapsed().as_secs_f64();

    let run_id = compute_run_id(&study, &inputs, &request.options.engine_version);
    let store = RunStore::for_study(request.study_path)?;

    emit_progress(&mut progress_cb, RunStage::CheckingCache, started, None);
    if request.options.use_cache && store.has_run(&run_id) {
        emit_progress(
            &mut progress_cb,
            RunStage::LoadingCachedResult,
            started,
            Some(run_id.clone()),
        );
        let cache_started = Instant::now();
        let manifest = store.load_manifest(&run_id)?;
        timing.load_cache_time_s = cache_started.elapsed().as_secs_f64();
        timing.total_time_s = started.elapsed().as_secs_f64();
        info!(run_id = %run_id, "Loaded cached run");

        emit_progress(
            &mut progress_cb,
            RunStage::Completed,
            started,
            Some("Loaded cached run".to_string()),
        );
        return Ok(RunResponse {
            run_id,
            manifest,
            loaded_from_cache: true,
            timing,
        });
    }

    emit_progress(&mut progress_cb, RunStage::Compiling, started, None);
    let compile_started = Instant::now();
    let compiled = compile_study(&study, inputs)?;
    timing.compile_time_s = compile_started.elapsed().as_secs_f64();
    info!(
        study = %study.name,
        reaches = compiled.network.len(),
        variants = compiled.config.variants.len(),
        "Study compiled"
    );

    emit_progress(&mut progress_cb, RunStage::RunningPipeline, started, None);
    let pipeline_started = Instant::now();
    let output = run_pipeline(&compiled.config, &compiled.store, &compiled.network)?;
    timing.pipeline_time_s = pipeline_started.elapsed().as_secs_f64();

    let manifest = RunManifest {
        run_id: run_id.clone(),
        study_name: study.name.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        engine_version: request.options.engine_version.clone(),
        attenuation_convention: compiled.config.routing.convention.as_str().to_string(),
        reach_count: compiled.network.len(),
        outlet_reaches: output.outlet_reaches.iter().map(|r| r.0).collect(),
        scenarios: output.scenarios,
        comparisons: output.comparisons,
        defaults_applied: counts_to_manifest(output.diagnostics.default_counts()),
        validation_flags: counts_to_manifest(output.diagnostics.flag_counts()),
    };

    emit_progress(&mut progress_cb, RunStage::SavingResults, started, None);
    let save_started = Instant::now();
    store.save_run(
        &manifest,
        &output.records,
        &DiagnosticsReport::from(&output.diagnostics),
    )?;
    timing.save_time_s = save_started.elapsed().as_secs_f64();
    timing.total_time_s = started.elapsed().as_secs_f64();
    info!(
        run_id = %run_id,
        records = output.records.len(),
        total_s = timing.total_time_s,
        "Run saved"
    );

    emit_progress(
        &mut progress_cb,
        RunStage::Completed,
        started,
        Some("Run completed".to_string()),
    );

    Ok(RunResponse {
        run_id,
        manifest,
        loaded_from_cache: false,
        timing,
    })
}

/// List cached runs of a study, newest first.
pub fn list_runs(study_path: &Path) -> AppResult<Vec<RunManifest>> {
    let store = RunStore::for_study(study_path)?;
    Ok(store.list_runs()?)
}

/// Load a cached run's manifest and records.
pub fn load_run(
    study_path: &Path,
    run_id: &str,
) -> AppResult<(RunManifest, Vec<ReachScenarioRecord>)> {
    let store = RunStore::for_study(study_path)?;
    if !store.has_run(run_id) {
        return Err(AppError::RunNotFound(run_id.to_string()));
    }
    let manifest = store.load_manifest(run_id)?;
    let records = store.load_records(run_id)?;
    Ok((manifest, records))
}

/// Load every default and flag recorded for a cached run.
pub fn load_run_diagnostics(study_path: &Path, run_id: &str) -> AppResult<DiagnosticsReport> {
    let store = RunStore::for_study(study_path)?;
    if !store.has_run(run_id) {
        return Err(AppError::RunNotFound(run_id.to_string()));
    }
    Ok(store.load_diagnostics(run_id)?)
}
