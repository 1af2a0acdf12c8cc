//! Scenario comparison: absolute and percentage reduction.

use serde::{Deserialize, Serialize};
use tp_core::{ReachId, Real, percent_of};

/// Reduction of one reach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReachReduction {
    pub reach: ReachId,
    pub reference: Real,
    pub scenario: Real,
    /// `reference - scenario`
    pub absolute: Real,
    /// `absolute / reference * 100`, 0 when the reference is 0.
    pub percent: Real,
}

/// Headline comparison of two scenarios.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonSummary {
    pub reference: String,
    pub scenario: String,
    pub reference_total: f64,
    pub scenario_total: f64,
    pub absolute: f64,
    pub percent: f64,
    pub outlet_reference: f64,
    pub outlet_scenario: f64,
    pub outlet_absolute: f64,
    pub outlet_percent: f64,
}

pub struct ScenarioComparator;

impl ScenarioComparator {
    pub fn reduction(reference: Real, scenario: Real) -> (Real, Real) {
        let absolute = reference - scenario;
        (absolute, percent_of(absolute, reference))
    }

    /// Per-reach reductions. Series are aligned by position with `reaches`.
    pub fn compare_reaches(
        reaches: &[ReachId],
        reference: &[Real],
        scenario: &[Real],
    ) -> Vec<ReachReduction> {
        reaches
            .iter()
            .zip(reference.iter().zip(scenario))
            .map(|(&reach, (&r, &s))| {
                let (absolute, percent) = Self::reduction(r, s);
                ReachReduction {
                    reach,
                    reference: r,
                    scenario: s,
                    absolute,
                    percent,
                }
            })
            .collect()
    }

    /// Aggregate comparison over all reaches and over the outlets.
    pub fn summarize(
        reference_name: &str,
        scenario_name: &str,
        reference: &[Real],
        scenario: &[Real],
        outlets: &[usize],
    ) -> ComparisonSummary {
        let reference_total: Real = reference.iter().sum();
        let scenario_total: Real = scenario.iter().sum();
        let outlet_reference: Real = outlets.iter().filter_map(|&i| reference.get(i)).sum();
        let outlet_scenario: Real = outlets.iter().filter_map(|&i| scenario.get(i)).sum();
        let (absolute, percent) = Self::reduction(reference_total, scenario_total);
        let (outlet_absolute, outlet_percent) = Self::reduction(outlet_reference, outlet_scenario);

        ComparisonSummary {
            reference: reference_name.to_string(),
            scenario: scenario_name.to_string(),
            reference_total,
            scenario_total,
            absolute,
            percent,
            outlet_reference,
            outlet_scenario,
            outlet_absolute,
            outlet_percent,
        }
    }
}
