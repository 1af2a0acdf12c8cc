//! Query helpers for extracting data from loaded runs.

use std::io::Write;
use std::path::Path;

use tp_results::{ReachScenarioRecord, RunManifest, write_records_csv};

use crate::error::{AppError, AppResult};
use crate::run_service::load_run;

/// Headline numbers of a stored run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub study_name: String,
    pub timestamp: String,
    pub reach_count: usize,
    pub scenarios: Vec<String>,
    pub record_count: usize,
    pub defaults_applied: usize,
    pub validation_flags: usize,
}

pub fn get_run_summary(
    manifest: &RunManifest,
    records: &[ReachScenarioRecord],
) -> AppResult<RunSummary> {
    if records.is_empty() {
        return Err(AppError::InvalidInput("No records in run".to_string()));
    }

    Ok(RunSummary {
        run_id: manifest.run_id.clone(),
        study_name: manifest.study_name.clone(),
        timestamp: manifest.timestamp.clone(),
        reach_count: manifest.reach_count,
        scenarios: list_scenarios(records),
        record_count: records.len(),
        defaults_applied: manifest.defaults_applied.values().sum(),
        validation_flags: manifest.validation_flags.values().sum(),
    })
}

/// Scenario names in the order they first appear.
pub fn list_scenarios(records: &[ReachScenarioRecord]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for record in records {
        if !out.contains(&record.scenario) {
            out.push(record.scenario.clone());
        }
    }
    out
}

pub fn scenario_records<'a>(
    records: &'a [ReachScenarioRecord],
    scenario: &str,
) -> AppResult<Vec<&'a ReachScenarioRecord>> {
    let selected: Vec<_> = records.iter().filter(|r| r.scenario == scenario).collect();
    if selected.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "Unknown scenario: {}",
            scenario
        )));
    }
    Ok(selected)
}

/// Every scenario's record for one reach.
pub fn reach_records(records: &[ReachScenarioRecord], reach_id: u64) -> Vec<&ReachScenarioRecord> {
    records.iter().filter(|r| r.reach_id == reach_id).collect()
}

/// The `n` reaches of a scenario with the largest routed reduction against
/// its reference, largest first.
pub fn largest_reductions<'a>(
    records: &'a [ReachScenarioRecord],
    scenario: &str,
    n: usize,
) -> AppResult<Vec<&'a ReachScenarioRecord>> {
    let mut selected: Vec<_> = scenario_records(records, scenario)?
        .into_iter()
        .filter(|r| r.reduction.is_some())
        .collect();
    selected.sort_by(|a, b| {
        let ra = a.reduction.as_ref().map_or(0.0, |x| x.routed_absolute);
        let rb = b.reduction.as_ref().map_or(0.0, |x| x.routed_absolute);
        rb.total_cmp(&ra).then(a.reach_id.cmp(&b.reach_id))
    });
    selected.truncate(n);
    Ok(selected)
}

/// Write a stored run as CSV, optionally one scenario only. Returns the
/// number of rows written.
pub fn export_run<W: Write>(
    study_path: &Path,
    run_id: &str,
    scenario: Option<&str>,
    writer: W,
) -> AppResult<usize> {
    let (_, records) = load_run(study_path, run_id)?;
    if let Some(s) = scenario {
        scenario_records(&records, s)?;
    }
    Ok(write_records_csv(writer, &records, scenario)?)
}
