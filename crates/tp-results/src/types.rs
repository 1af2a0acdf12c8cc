//! Result data types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tp_core::{CoverageCategory, DefaultApplied, Diagnostics, Pathway, ValidationFlag};

use crate::compare::ComparisonSummary;

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub run_id: RunId,
    pub study_name: String,
    pub timestamp: String,
    pub engine_version: String,
    /// `receiving` or `upstream`.
    pub attenuation_convention: String,
    pub reach_count: usize,
    pub outlet_reaches: Vec<u64>,
    pub scenarios: Vec<ScenarioSummary>,
    pub comparisons: Vec<ComparisonSummary>,
    #[serde(default)]
    pub defaults_applied: BTreeMap<String, usize>,
    #[serde(default)]
    pub validation_flags: BTreeMap<String, usize>,
}

/// Totals of one scenario over all reaches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioSummary {
    pub scenario: String,
    pub generated_total: f64,
    pub routed_total: f64,
    /// Routed load summed over outlet reaches (the lake estimate).
    pub outlet_routed_total: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PathwayRecord {
    pub pathway: Pathway,
    pub input: f64,
    pub removed: f64,
    pub remaining: f64,
}

/// Reduction of a scenario against its reference scenario for one reach.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReductionRecord {
    pub reference: String,
    pub generated_absolute: f64,
    pub generated_percent: f64,
    pub routed_absolute: f64,
    pub routed_percent: f64,
}

/// One reach under one scenario.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReachScenarioRecord {
    pub reach_id: u64,
    pub scenario: String,
    pub hydseq: i64,
    /// False for network reaches missing from the reach table.
    pub has_attributes: bool,
    pub gross_load: f64,
    pub available_load: f64,
    pub ag_filter_applied: bool,
    pub generated_load: f64,
    pub routed_load: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_category: Option<CoverageCategory>,
    pub applied_removal_fraction: f64,
    pub clay_override: bool,
    pub bank_erosion_load: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pathways: Vec<PathwayRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduction: Option<ReductionRecord>,
}

impl ReachScenarioRecord {
    pub fn ext_code(&self) -> Option<u8> {
        self.coverage_category.map(CoverageCategory::ext_code)
    }
}

/// Every default applied and flag raised during a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticsReport {
    pub defaults: Vec<DefaultApplied>,
    pub flags: Vec<ValidationFlag>,
}

impl From<&Diagnostics> for DiagnosticsReport {
    fn from(d: &Diagnostics) -> Self {
        Self {
            defaults: d.defaults().to_vec(),
            flags: d.flags().to_vec(),
        }
    }
}

/// Convert a diagnostics tally to manifest form.
pub fn counts_to_manifest(counts: tp_core::DiagnosticCounts) -> BTreeMap<String, usize> {
    counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}
