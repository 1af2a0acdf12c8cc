//! The load pipeline: split and mitigate every reach, route each scenario
//! through the network, then compare and check the results.
//!
//! `run_pipeline` is pure apart from logging: it reads the compiled study
//! and returns records, summaries and diagnostics without touching disk.

use tracing::{debug, info, info_span, warn};

use tp_core::{ChemicalFraction, DefaultApplied, Diagnostics, Pathway, ReachAttributeStore, ReachId, Real};
use tp_mitigation::{MitigationEngine, MitigationRequest, ReachMitigation};
use tp_network::ReachNetwork;
use tp_results::{
    ComparisonSummary, PathwayRecord, ReachScenarioRecord, ReductionRecord, ScenarioComparator,
    ScenarioSummary, check_against_baseline,
};
use tp_routing::{NetworkRouter, RoutedScenario, ScenarioLoads};

use crate::compile::PipelineConfig;
use crate::error::AppResult;

/// Scenario name of the available load without wetlands.
pub const BASELINE: &str = "baseline";
/// Scenario name of the load before the lake-level rise.
pub const PRE_INUNDATION: &str = "pre_inundation";

/// Everything one pipeline pass produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// One record per (scenario, reach), scenarios in `scenario_names`
    /// order and reaches in processing order.
    pub records: Vec<ReachScenarioRecord>,
    pub scenarios: Vec<ScenarioSummary>,
    pub comparisons: Vec<ComparisonSummary>,
    pub outlet_reaches: Vec<ReachId>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Copy)]
enum ScenarioKind<'c> {
    Baseline,
    Variant(&'c str),
    PreInundation,
}

/// Scenario names of a run, in output order.
pub fn scenario_names(config: &PipelineConfig) -> Vec<String> {
    scenarios(config)
        .into_iter()
        .map(|(name, _)| name)
        .collect()
}

fn scenarios(config: &PipelineConfig) -> Vec<(String, ScenarioKind<'_>)> {
    let mut out = vec![(BASELINE.to_string(), ScenarioKind::Baseline)];
    out.extend(
        config
            .variants
            .iter()
            .map(|v| (v.clone(), ScenarioKind::Variant(v.as_str()))),
    );
    if config.pre_inundation {
        out.push((PRE_INUNDATION.to_string(), ScenarioKind::PreInundation));
    }
    out
}

/// Run the whole pipeline over a compiled study.
pub fn run_pipeline(
    config: &PipelineConfig,
    store: &ReachAttributeStore,
    network: &ReachNetwork,
) -> AppResult<PipelineOutput> {
    let _span = info_span!("run_pipeline", reaches = network.len()).entered();

    let engine = MitigationEngine::new(&config.policy, &config.splits, &config.table);
    let request = MitigationRequest {
        variants: &config.variants,
        pre_inundation: config.pre_inundation,
    };
    let (mitigations, mut diagnostics) = engine.mitigate_all(store, &request);
    info!(
        reaches = mitigations.len(),
        variants = config.variants.len(),
        "Mitigation complete"
    );

    let mut by_idx: Vec<Option<&ReachMitigation>> = vec![None; network.len()];
    for m in &mitigations {
        let idx = network.idx_of(m.reach)?;
        by_idx[idx.as_usize()] = Some(m);
    }
    for reach in network.reaches() {
        if by_idx[reach.idx.as_usize()].is_none() {
            diagnostics.default_applied(DefaultApplied::ReachWithoutAttributes { reach: reach.id });
        }
    }

    let scenarios = scenarios(config);
    let loads: Vec<ScenarioLoads> = scenarios
        .iter()
        .map(|(name, kind)| ScenarioLoads {
            scenario: name.clone(),
            generated: generated_loads(&by_idx, *kind),
        })
        .collect();

    let (router, routing_diags) = NetworkRouter::from_store(network, store, &config.routing)?;
    diagnostics.merge(routing_diags);
    let routed = router.route_all(&loads)?;
    for r in &routed {
        debug!(
            scenario = %r.scenario,
            outlet_total = r.outlet_total(network),
            convention = router.convention().as_str(),
            "Scenario routed"
        );
    }
    info!(scenarios = routed.len(), "Routing complete");

    let reach_ids: Vec<ReachId> = network.reaches().iter().map(|r| r.id).collect();
    let outlets = network.outlets();
    let outlet_positions: Vec<usize> = outlets.iter().map(|idx| idx.as_usize()).collect();

    let summaries = routed
        .iter()
        .map(|r| ScenarioSummary {
            scenario: r.scenario.clone(),
            generated_total: r.generated.iter().sum(),
            routed_total: r.routed.iter().sum(),
            outlet_routed_total: r.outlet_total(network),
        })
        .collect();

    // Position 0 is always the baseline.
    let baseline = &routed[0];
    let pre = routed
        .iter()
        .zip(&scenarios)
        .find(|(_, (_, kind))| matches!(kind, ScenarioKind::PreInundation))
        .map(|(r, _)| r);

    let mut comparisons = Vec::new();
    diagnostics.merge(check_against_baseline(
        BASELINE,
        &reach_ids,
        (&[], &[]),
        (&baseline.generated, &baseline.routed),
    ));
    for (r, (_, kind)) in routed.iter().zip(&scenarios) {
        if !matches!(kind, ScenarioKind::Variant(_)) {
            continue;
        }
        comparisons.push(ScenarioComparator::summarize(
            BASELINE,
            &r.scenario,
            &baseline.routed,
            &r.routed,
            &outlet_positions,
        ));
        diagnostics.merge(check_against_baseline(
            &r.scenario,
            &reach_ids,
            (&baseline.generated, &baseline.routed),
            (&r.generated, &r.routed),
        ));
    }
    if let Some(pre) = pre {
        comparisons.push(ScenarioComparator::summarize(
            PRE_INUNDATION,
            BASELINE,
            &pre.routed,
            &baseline.routed,
            &outlet_positions,
        ));
        // The lake-level rise may raise or lower loads, so only sign is checked.
        diagnostics.merge(check_against_baseline(
            PRE_INUNDATION,
            &reach_ids,
            (&[], &[]),
            (&pre.generated, &pre.routed),
        ));
    }

    let mut records = Vec::with_capacity(routed.len() * network.len());
    for (r, (_, kind)) in routed.iter().zip(&scenarios) {
        let reference = match kind {
            ScenarioKind::Baseline => pre,
            ScenarioKind::Variant(_) => Some(baseline),
            ScenarioKind::PreInundation => None,
        };
        for idx in network.order().iter() {
            records.push(reach_record(
                config,
                network,
                idx.as_usize(),
                by_idx[idx.as_usize()],
                *kind,
                r,
                reference,
            ));
        }
    }

    let default_counts = diagnostics.default_counts();
    for (kind, count) in &default_counts {
        warn!(kind = *kind, count = *count, "Defaults applied");
    }
    for (kind, count) in &diagnostics.flag_counts() {
        warn!(kind = *kind, count = *count, "Validation flags raised");
    }

    Ok(PipelineOutput {
        records,
        scenarios: summaries,
        comparisons,
        outlet_reaches: outlets
            .iter()
            .map(|&idx| reach_ids[idx.as_usize()])
            .collect(),
        diagnostics,
    })
}

/// Generated load per reach index for one scenario. Reaches without
/// attributes contribute nothing.
fn generated_loads(by_idx: &[Option<&ReachMitigation>], kind: ScenarioKind<'_>) -> Vec<Real> {
    by_idx
        .iter()
        .map(|m| match (m, kind) {
            (None, _) => 0.0,
            (Some(m), ScenarioKind::Baseline) => m.baseline_load(),
            (Some(m), ScenarioKind::Variant(id)) => m
                .variant(id)
                .map_or(m.baseline_load(), |load| load.with_mitigation),
            (Some(m), ScenarioKind::PreInundation) => m
                .pre_inundation
                .map_or(m.baseline_load(), |load| load.available),
        })
        .collect()
}

fn reach_record(
    config: &PipelineConfig,
    network: &ReachNetwork,
    pos: usize,
    mitigation: Option<&ReachMitigation>,
    kind: ScenarioKind<'_>,
    routed: &RoutedScenario,
    reference: Option<&RoutedScenario>,
) -> ReachScenarioRecord {
    let reach = &network.reaches()[pos];
    let generated_load = routed.generated[pos];
    let routed_load = routed.routed[pos];

    let mut record = ReachScenarioRecord {
        reach_id: reach.id.0,
        scenario: routed.scenario.clone(),
        hydseq: reach.hydseq,
        has_attributes: mitigation.is_some(),
        gross_load: 0.0,
        available_load: 0.0,
        ag_filter_applied: false,
        generated_load,
        routed_load,
        coverage_percent: None,
        coverage_category: None,
        applied_removal_fraction: 0.0,
        clay_override: false,
        bank_erosion_load: 0.0,
        pathways: Vec::new(),
        reduction: reference.map(|reference| {
            let (generated_absolute, generated_percent) =
                ScenarioComparator::reduction(reference.generated[pos], generated_load);
            let (routed_absolute, routed_percent) =
                ScenarioComparator::reduction(reference.routed[pos], routed_load);
            ReductionRecord {
                reference: reference.scenario.clone(),
                generated_absolute,
                generated_percent,
                routed_absolute,
                routed_percent,
            }
        }),
    };

    let Some(m) = mitigation else {
        return record;
    };

    match kind {
        ScenarioKind::Baseline => {
            record.gross_load = m.available.gross;
            record.available_load = m.available.available;
            record.ag_filter_applied = m.available.ag_filter_applied;
            record.bank_erosion_load = m.split.bank_erosion_total();
            record.pathways = Pathway::ALL
                .iter()
                .map(|&pathway| {
                    let input: Real = ChemicalFraction::ALL
                        .iter()
                        .map(|&f| m.split.fraction(f).pathways[pathway])
                        .sum();
                    PathwayRecord {
                        pathway,
                        input,
                        removed: 0.0,
                        remaining: input,
                    }
                })
                .collect();
        }
        ScenarioKind::Variant(id) => {
            record.gross_load = m.available.gross;
            record.available_load = m.available.available;
            record.ag_filter_applied = m.available.ag_filter_applied;
            if let Some(load) = m.variant(id) {
                record.coverage_percent = Some(load.coverage_percent);
                record.coverage_category = load.category;
                record.applied_removal_fraction = load.applied_removal_fraction();
                record.clay_override = load.clay_override;
                record.bank_erosion_load = load.bank_erosion;
                record.pathways = load
                    .pathway_totals()
                    .iter()
                    .map(|(pathway, t)| PathwayRecord {
                        pathway,
                        input: t.input,
                        removed: t.removed,
                        remaining: t.remaining,
                    })
                    .collect();
            }
        }
        ScenarioKind::PreInundation => {
            let pre = m.pre_inundation.unwrap_or(m.available);
            record.gross_load = pre.gross;
            record.available_load = pre.available;
            record.ag_filter_applied = pre.ag_filter_applied;
            record.bank_erosion_load = pre.available * config.policy.bank_erosion_share();
        }
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{build_network, compile_config};
    use tp_core::{PathwaySplit, PerPathway, ReachAttributes};
    use tp_project::{
        CoverageVariantDef, EdgeRow, FractionSplitsDef, InputsDef, PolicyDef, RemovalFactorDef,
        StudyDef,
    };

    fn config(inundation: bool) -> PipelineConfig {
        let study = StudyDef {
            version: 1,
            name: "pipeline".to_string(),
            policy: PolicyDef::default(),
            fraction_splits: FractionSplitsDef::default(),
            coverage_variants: vec![CoverageVariantDef {
                id: "surface_gw".to_string(),
                name: "Surface and groundwater".to_string(),
            }],
            removal_factors: vec![],
            inputs: InputsDef {
                reaches: "reaches.csv".to_string(),
                edges: "edges.csv".to_string(),
                removal_factors: None,
            },
            inundation_comparison: inundation,
        };
        let factors: Vec<RemovalFactorDef> = Pathway::ALL
            .iter()
            .map(|&pathway| RemovalFactorDef {
                ext_code: 3,
                pathway,
                part_p: 50.0,
                drp: 50.0,
                dop: 50.0,
            })
            .collect();
        compile_config(&study, &factors).unwrap()
    }

    fn chain() -> ReachNetwork {
        build_network(&[
            EdgeRow {
                reach_id: 10,
                hydseq: 1,
                from_node: 0,
                to_node: 1,
            },
            EdgeRow {
                reach_id: 14,
                hydseq: 2,
                from_node: 1,
                to_node: 2,
            },
        ])
        .unwrap()
    }

    fn reach(id: u64, gross: f64, coverage: f64) -> ReachAttributes {
        ReachAttributes::new(id, gross)
            .with_ag_percent(80.0)
            .with_clay_percent(10.0)
            .with_pathway_split(PathwaySplit::from_shares(PerPathway([0.4, 0.2, 0.2, 0.1, 0.1])))
            .with_coverage("surface_gw", coverage)
            .with_attenuation(0.9)
    }

    #[test]
    fn scenario_order_is_baseline_variants_pre() {
        assert_eq!(
            scenario_names(&config(true)),
            vec!["baseline", "surface_gw", "pre_inundation"]
        );
        assert_eq!(scenario_names(&config(false)), vec!["baseline", "surface_gw"]);
    }

    #[test]
    fn chain_routes_and_reduces() {
        let cfg = config(false);
        let store =
            ReachAttributeStore::from_records(vec![reach(10, 10.0, 5.0), reach(14, 4.0, 0.0)], 0.01)
                .unwrap();
        let network = chain();
        let out = run_pipeline(&cfg, &store, &network).unwrap();

        assert_eq!(out.records.len(), 4);
        assert_eq!(out.outlet_reaches, vec![ReachId(14)]);

        let base = &out.scenarios[0];
        assert_eq!(base.scenario, "baseline");
        // 4 + 10 * 0.9
        assert!((base.outlet_routed_total - 13.0).abs() < 1e-9);

        let cw = &out.scenarios[1];
        assert!(cw.outlet_routed_total < base.outlet_routed_total);
        assert_eq!(out.comparisons.len(), 1);
        assert!(out.comparisons[0].outlet_percent > 0.0);
        assert!(out.diagnostics.flags().is_empty());

        let upstream_cw = out
            .records
            .iter()
            .find(|r| r.reach_id == 10 && r.scenario == "surface_gw")
            .unwrap();
        assert_eq!(upstream_cw.ext_code(), Some(3));
        assert_eq!(upstream_cw.pathways.len(), 5);
        assert_eq!(upstream_cw.reduction.as_ref().unwrap().reference, "baseline");
    }

    #[test]
    fn reach_without_attributes_carries_upstream_load() {
        let cfg = config(true);
        let store = ReachAttributeStore::from_records(vec![reach(10, 10.0, 0.0)], 0.01).unwrap();
        let network = chain();
        let out = run_pipeline(&cfg, &store, &network).unwrap();

        let counts = out.diagnostics.default_counts();
        assert_eq!(counts.get("reach_without_attributes"), Some(&1));
        assert_eq!(counts.get("missing_pre_inundation_load"), Some(&1));

        let downstream = out
            .records
            .iter()
            .find(|r| r.reach_id == 14 && r.scenario == "baseline")
            .unwrap();
        assert!(!downstream.has_attributes);
        assert_eq!(downstream.generated_load, 0.0);
        assert!((downstream.routed_load - 9.0).abs() < 1e-9);
        assert_eq!(
            downstream.reduction.as_ref().unwrap().reference,
            "pre_inundation"
        );
        assert_eq!(out.comparisons.len(), 2);
        assert_eq!(out.comparisons[1].reference, "pre_inundation");
    }
}
