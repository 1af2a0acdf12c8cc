use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use tp_core::{DefaultApplied, ReachId};
use tp_results::{
    DiagnosticsReport, ReachScenarioRecord, ResultsError, RunManifest, RunStore, ScenarioSummary,
};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn manifest(run_id: &str, timestamp: &str) -> RunManifest {
    RunManifest {
        run_id: run_id.to_string(),
        study_name: "test".to_string(),
        timestamp: timestamp.to_string(),
        engine_version: "0.1.0".to_string(),
        attenuation_convention: "receiving".to_string(),
        reach_count: 1,
        outlet_reaches: vec![1],
        scenarios: vec![ScenarioSummary {
            scenario: "baseline".to_string(),
            generated_total: 10.0,
            routed_total: 10.0,
            outlet_routed_total: 10.0,
        }],
        comparisons: vec![],
        defaults_applied: BTreeMap::from([("missing_clay".to_string(), 1)]),
        validation_flags: BTreeMap::new(),
    }
}

fn record() -> ReachScenarioRecord {
    ReachScenarioRecord {
        reach_id: 1,
        scenario: "baseline".to_string(),
        hydseq: 1,
        has_attributes: true,
        gross_load: 10.0,
        available_load: 10.0,
        ag_filter_applied: false,
        generated_load: 10.0,
        routed_load: 10.0,
        coverage_percent: None,
        coverage_category: None,
        applied_removal_fraction: 0.0,
        clay_override: false,
        bank_erosion_load: 5.0,
        pathways: vec![],
        reduction: None,
    }
}

#[test]
fn save_list_load_roundtrip() {
    let study_dir = unique_temp_dir("tp_results_study");
    fs::create_dir_all(&study_dir).expect("failed to create temp study dir");
    let study_path = study_dir.join("study.yaml");

    let store = RunStore::for_study(&study_path).expect("failed to create run store");
    assert!(store.root_dir().ends_with(".tpload/runs"));

    let diagnostics = DiagnosticsReport {
        defaults: vec![DefaultApplied::MissingClay { reach: ReachId(1) }],
        flags: vec![],
    };
    store
        .save_run(&manifest("run-a", "2026-01-01T00:00:00Z"), &[record()], &diagnostics)
        .expect("failed to save run");
    store
        .save_run(&manifest("run-b", "2026-02-01T00:00:00Z"), &[record()], &DiagnosticsReport::default())
        .expect("failed to save run");

    assert!(store.has_run("run-a"));
    let runs = store.list_runs().expect("failed to list runs");
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].run_id, "run-b");

    let loaded = store.load_manifest("run-a").expect("failed to load manifest");
    assert_eq!(loaded, manifest("run-a", "2026-01-01T00:00:00Z"));

    let records = store.load_records("run-a").expect("failed to load records");
    assert_eq!(records, vec![record()]);

    let diags = store.load_diagnostics("run-a").expect("failed to load diagnostics");
    assert_eq!(diags, diagnostics);

    store.delete_run("run-a").unwrap();
    assert!(!store.has_run("run-a"));
}

#[test]
fn missing_run_is_reported() {
    let store = RunStore::new(unique_temp_dir("tp_results_empty")).unwrap();
    assert!(matches!(
        store.load_manifest("nope"),
        Err(ResultsError::RunNotFound { .. })
    ));
    assert!(store.list_runs().unwrap().is_empty());
}
