//! Routing on small synthetic networks.

use proptest::prelude::*;
use tp_core::{ReachId, Real};
use tp_network::{NetworkBuilder, ReachEdge, ReachNetwork};
use tp_routing::{AttenuationConvention, NetworkRouter, ScenarioLoads};

fn diamond() -> ReachNetwork {
    // A -> {B, C} -> D
    let edges = [(1, 10, 0, 1), (2, 20, 1, 2), (3, 21, 1, 2), (4, 30, 2, 3)];
    NetworkBuilder::from_edges(edges.map(|(reach, hydseq, from_node, to_node)| ReachEdge {
        reach: ReachId(reach),
        hydseq,
        from_node,
        to_node,
    }))
    .build()
    .unwrap()
}

#[test]
fn diamond_aggregation_uses_receiving_factor() {
    let net = diamond();
    let idx = |id: u64| net.idx_of(ReachId(id)).unwrap();
    let mut factors = vec![0.0; 4];
    factors[idx(1).as_usize()] = 0.1;
    factors[idx(2).as_usize()] = 0.8;
    factors[idx(3).as_usize()] = 0.5;
    factors[idx(4).as_usize()] = 0.9;
    let mut generated = vec![0.0; 4];
    generated[idx(1).as_usize()] = 10.0;
    generated[idx(2).as_usize()] = 2.0;
    generated[idx(3).as_usize()] = 3.0;
    generated[idx(4).as_usize()] = 1.0;

    let router = NetworkRouter::with_factors(&net, factors, AttenuationConvention::Receiving).unwrap();
    let out = router
        .route(&ScenarioLoads {
            scenario: "baseline".into(),
            generated,
        })
        .unwrap();

    let a = 10.0;
    let b = 2.0 + a * 0.8;
    let c = 3.0 + a * 0.5;
    let d = 1.0 + (b + c) * 0.9;
    assert_eq!(out.routed_at(idx(1)), a);
    assert!((out.routed_at(idx(2)) - b).abs() < 1e-12);
    assert!((out.routed_at(idx(3)) - c).abs() < 1e-12);
    assert!((out.routed_at(idx(4)) - d).abs() < 1e-12);
    assert!((out.outlet_total(&net) - d).abs() < 1e-12);
}

#[test]
fn route_all_keeps_scenario_order() {
    let net = diamond();
    let router = NetworkRouter::with_factors(&net, vec![1.0; 4], AttenuationConvention::Receiving).unwrap();
    let scenarios: Vec<_> = ["baseline", "surface_gw", "surface_only"]
        .iter()
        .map(|s| ScenarioLoads {
            scenario: s.to_string(),
            generated: vec![1.0; 4],
        })
        .collect();
    let out = router.route_all(&scenarios).unwrap();
    let names: Vec<_> = out.iter().map(|r| r.scenario.as_str()).collect();
    assert_eq!(names, ["baseline", "surface_gw", "surface_only"]);
    // A feeds both branches, so its unit reaches D twice: 1 + (1 + 1) + (1 + 1).
    assert_eq!(out[0].outlet_total(&net), 5.0);
}

#[test]
fn diverging_node_sends_full_load_down_every_branch() {
    let net = diamond();
    let idx = |id: u64| net.idx_of(ReachId(id)).unwrap();
    let mut generated = vec![0.0; 4];
    generated[idx(1).as_usize()] = 6.0;

    let router = NetworkRouter::with_factors(&net, vec![1.0; 4], AttenuationConvention::Receiving).unwrap();
    let out = router
        .route(&ScenarioLoads {
            scenario: "baseline".into(),
            generated,
        })
        .unwrap();

    assert_eq!(out.routed_at(idx(2)), 6.0);
    assert_eq!(out.routed_at(idx(3)), 6.0);
    assert_eq!(out.routed_at(idx(4)), 12.0);
}

proptest! {
    /// Routed never drops below generated, and lowering generated loads
    /// never raises any routed load.
    #[test]
    fn routed_is_monotone_in_generated(
        base in prop::collection::vec(0.0..100.0f64, 4),
        cut in prop::collection::vec(0.0..=1.0f64, 4),
        factors in prop::collection::vec(0.0..=1.0f64, 4),
    ) {
        let net = diamond();
        let router = NetworkRouter::with_factors(&net, factors, AttenuationConvention::Receiving).unwrap();
        let mitigated: Vec<Real> = base.iter().zip(&cut).map(|(b, c)| b * c).collect();

        let out = router.route_all(&[
            ScenarioLoads { scenario: "baseline".into(), generated: base },
            ScenarioLoads { scenario: "mitigated".into(), generated: mitigated },
        ]).unwrap();

        for i in 0..4 {
            prop_assert!(out[0].routed[i] >= out[0].generated[i]);
            prop_assert!(out[1].routed[i] <= out[0].routed[i] + 1e-9);
        }
        for reach in net.reaches() {
            if net.upstream(reach.idx).is_empty() {
                prop_assert_eq!(out[0].routed_at(reach.idx), out[0].generated_at(reach.idx));
            }
        }
    }
}
