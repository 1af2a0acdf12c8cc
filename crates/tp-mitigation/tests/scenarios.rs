//! End-to-end mitigation of single reaches.

use proptest::prelude::*;
use tp_core::{
    ChemicalFraction, CoverageCategory, Pathway, PathwaySplit, PerPathway, ReachAttributeStore,
    ReachAttributes, Real,
};
use tp_mitigation::{
    FractionSplits, MitigationEngine, MitigationPolicy, MitigationRequest, RemovalFactorTable,
    RemovalRule,
};

/// The same percent remaining for every key in every category.
fn uniform_table(percent_remaining: Real) -> RemovalFactorTable {
    let mut table = RemovalFactorTable::new();
    for c in CoverageCategory::ALL {
        for p in Pathway::ALL {
            for f in ChemicalFraction::ALL {
                table.insert_percent(c, p, f, percent_remaining).unwrap();
            }
        }
    }
    table
}

fn variants() -> Vec<String> {
    vec!["surface_gw".to_string()]
}

#[test]
fn single_reach_low_coverage() {
    let policy = MitigationPolicy {
        bypass: Vec::new(),
        ..MitigationPolicy::default()
    };
    let splits = FractionSplits::default();
    let table = uniform_table(74.0);
    let engine = MitigationEngine::new(&policy, &splits, &table);
    let variants = variants();
    let request = MitigationRequest {
        variants: &variants,
        pre_inundation: false,
    };

    let reach = ReachAttributes::new(1, 100.0)
        .with_ag_percent(100.0)
        .with_clay_percent(0.0)
        .with_coverage("surface_gw", 1.0);
    let (out, diags) = engine.mitigate_reach(&reach, &request);
    let load = out.variant("surface_gw").unwrap();

    assert_eq!(load.category, Some(CoverageCategory::Low));
    assert!((load.bank_erosion - 50.0).abs() < 1e-9);
    // 50 bank + 0.74 * (25 + 12.5 + 12.5)
    assert!((load.with_mitigation - 87.0).abs() < 1e-9);
    assert!((load.applied_removal_fraction() - 0.26).abs() < 1e-9);
    // Fallback split was used for pathways.
    assert_eq!(diags.default_counts().get("missing_pathway_split"), Some(&1));
}

#[test]
fn single_reach_low_coverage_with_deep_groundwater_bypass() {
    let policy = MitigationPolicy::default();
    let splits = FractionSplits::default();
    let table = uniform_table(74.0);
    let engine = MitigationEngine::new(&policy, &splits, &table);
    let variants = variants();
    let request = MitigationRequest {
        variants: &variants,
        pre_inundation: false,
    };

    let reach = ReachAttributes::new(1, 100.0)
        .with_ag_percent(100.0)
        .with_clay_percent(0.0)
        .with_pathway_split(PathwaySplit::from_percentages(PerPathway([
            40.0, 20.0, 20.0, 10.0, 10.0,
        ])))
        .with_coverage("surface_gw", 1.0);
    let (out, diags) = engine.mitigate_reach(&reach, &request);
    let load = out.variant("surface_gw").unwrap();

    // DG shares of DRP and DOP (1.25 each) are untreated.
    assert!((load.with_mitigation - 87.65).abs() < 1e-9);
    let dg = load.outcomes[ChemicalFraction::DissolvedReactive][Pathway::DeepGroundwater];
    assert_eq!(dg.rule, RemovalRule::Bypass);
    assert_eq!(dg.removed, 0.0);
    assert!(diags.is_clean());
}

#[test]
fn high_clay_means_no_removal() {
    let policy = MitigationPolicy::default();
    let splits = FractionSplits::default();
    let table = uniform_table(10.0);
    let engine = MitigationEngine::new(&policy, &splits, &table);
    let variants = variants();
    let request = MitigationRequest {
        variants: &variants,
        pre_inundation: false,
    };

    let reach = ReachAttributes::new(2, 100.0)
        .with_ag_percent(100.0)
        .with_clay_percent(60.0)
        .with_coverage("surface_gw", 8.0);
    let (out, _) = engine.mitigate_reach(&reach, &request);
    let load = out.variant("surface_gw").unwrap();

    assert!(load.clay_override);
    assert_eq!(load.category, Some(CoverageCategory::High));
    assert_eq!(load.removed_total(), 0.0);
    assert_eq!(load.with_mitigation, out.baseline_load());
}

#[test]
fn split_inside_tolerance_loses_no_load_under_high_clay() {
    let policy = MitigationPolicy::default();
    let splits = FractionSplits::default();
    let table = uniform_table(10.0);
    let engine = MitigationEngine::new(&policy, &splits, &table);
    let variants = variants();
    let request = MitigationRequest {
        variants: &variants,
        pre_inundation: false,
    };

    // Shares sum to 0.995, inside the 0.01 tolerance.
    let reach = ReachAttributes::new(5, 100.0)
        .with_ag_percent(100.0)
        .with_clay_percent(60.0)
        .with_pathway_split(PathwaySplit::from_percentages(PerPathway([
            40.0, 20.0, 20.0, 10.0, 9.5,
        ])))
        .with_coverage("surface_gw", 8.0);
    let store = ReachAttributeStore::from_records(vec![reach.clone()], 0.01).unwrap();
    assert!(store.contains(reach.id));

    let (out, diags) = engine.mitigate_reach(&reach, &request);
    let load = out.variant("surface_gw").unwrap();

    assert!(load.clay_override);
    assert_eq!(load.removed_total(), 0.0);
    assert!((load.with_mitigation - out.baseline_load()).abs() < 1e-12);
    assert!((out.baseline_load() - 100.0).abs() < 1e-12);
    for (_, fraction) in out.split.fractions.iter() {
        assert!((fraction.pathways.sum() - fraction.mitigable).abs() < 1e-12);
    }
    assert!(diags.is_clean());
}

#[test]
fn coverage_on_lower_threshold_is_medium() {
    let policy = MitigationPolicy::default();
    let splits = FractionSplits::default();
    let table = uniform_table(50.0);
    let engine = MitigationEngine::new(&policy, &splits, &table);
    let variants = variants();
    let request = MitigationRequest {
        variants: &variants,
        pre_inundation: false,
    };

    let at_two = ReachAttributes::new(3, 10.0).with_coverage("surface_gw", 2.0);
    let at_four = ReachAttributes::new(4, 10.0).with_coverage("surface_gw", 4.0);
    for (reach, expected) in [(at_two, CoverageCategory::Medium), (at_four, CoverageCategory::Medium)] {
        let (out, _) = engine.mitigate_reach(&reach, &request);
        assert_eq!(out.variant("surface_gw").unwrap().category, Some(expected));
    }
}

#[test]
fn mitigate_all_keeps_store_order() {
    let policy = MitigationPolicy::default();
    let splits = FractionSplits::default();
    let table = uniform_table(74.0);
    let engine = MitigationEngine::new(&policy, &splits, &table);
    let variants = variants();
    let request = MitigationRequest {
        variants: &variants,
        pre_inundation: false,
    };

    let store = ReachAttributeStore::from_records(
        (1..=50u64).rev().map(|i| ReachAttributes::new(i, i as Real)).collect(),
        0.01,
    )
    .unwrap();
    let (out, diags) = engine.mitigate_all(&store, &request);
    let ids: Vec<u64> = out.iter().map(|r| r.reach.0).collect();
    assert_eq!(ids, (1..=50u64).rev().collect::<Vec<_>>());
    assert_eq!(diags.default_counts().get("missing_coverage"), Some(&50));
}

fn arb_split() -> impl Strategy<Value = Option<PathwaySplit>> {
    prop::option::of(prop::array::uniform5(0.0..10.0f64).prop_filter_map(
        "non-zero total",
        |raw| {
            let total: Real = raw.iter().sum();
            (total > 1e-3).then(|| {
                PathwaySplit::from_shares(PerPathway(raw.map(|v| v / total)))
            })
        },
    ))
}

proptest! {
    #[test]
    fn conservation_and_no_over_reduction(
        gross in 0.0..1000.0f64,
        ag in prop::option::of(0.0..=100.0f64),
        clay in prop::option::of(0.0..=100.0f64),
        coverage in 0.0..20.0f64,
        remaining in 0.0..=100.0f64,
        split in arb_split(),
    ) {
        let policy = MitigationPolicy::default();
        let splits = FractionSplits::default();
        let table = uniform_table(remaining);
        let engine = MitigationEngine::new(&policy, &splits, &table);
        let variants = variants();
        let request = MitigationRequest { variants: &variants, pre_inundation: false };

        let mut reach = ReachAttributes::new(1, gross).with_coverage("surface_gw", coverage);
        reach.ag_percent = ag;
        reach.clay_percent = clay;
        reach.pathway_split = split;

        let (out, _) = engine.mitigate_reach(&reach, &request);
        let tol = 1e-6 * out.baseline_load().max(1.0);

        // Fractions sum to the available load.
        let fraction_total: Real = out.split.fractions.values().iter().map(|f| f.total).sum();
        prop_assert!((fraction_total - out.baseline_load()).abs() <= tol);

        for (fraction, load) in out.split.fractions.iter() {
            let pathway_total = load.pathways.sum();
            prop_assert!((pathway_total - load.mitigable).abs() <= tol);
            if fraction == ChemicalFraction::Particulate {
                prop_assert_eq!(load.pathways[Pathway::SurfaceRunoff], load.mitigable);
            }
        }

        let mitigated = out.variant("surface_gw").unwrap();
        prop_assert!(mitigated.with_mitigation >= mitigated.bank_erosion - tol);
        prop_assert!(mitigated.with_mitigation <= out.baseline_load() + tol);
        if out.clay_percent > policy.clay_threshold_percent {
            prop_assert_eq!(mitigated.removed_total(), 0.0);
        }
    }
}
