//! Study compilation: `StudyDef` + input tables -> immutable pipeline inputs.

use tp_core::{
    ChemicalFraction, CoverageCategory, PerFraction, ReachAttributeStore, ReachId, Real,
};
use tp_mitigation::{
    BypassRule, CoverageThresholds, FractionSplits, MitigationPolicy, RemovalFactorRow,
    RemovalFactorTable,
};
use tp_network::{NetworkBuilder, NetworkError, ReachEdge, ReachNetwork};
use tp_project::{
    AttenuationConventionDef, EdgeRow, FractionSplitsDef, RemovalFactorDef, StudyDef, StudyInputs,
};
use tp_routing::{AttenuationConvention, RoutingPolicy};

use crate::error::{AppError, AppResult};

/// Every policy value and lookup table a run needs, built once per run and
/// passed by reference into each stage.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub policy: MitigationPolicy,
    pub splits: FractionSplits,
    pub table: RemovalFactorTable,
    pub routing: RoutingPolicy,
    /// Coverage variant ids, in study order.
    pub variants: Vec<String>,
    pub pre_inundation: bool,
}

/// A study ready to run: configuration, reach attributes and network.
#[derive(Debug, Clone)]
pub struct CompiledStudy {
    pub config: PipelineConfig,
    pub store: ReachAttributeStore,
    pub network: ReachNetwork,
}

/// Compile the study definition alone. `removal_factors` are the merged
/// inline and file rows.
pub fn compile_config(
    study: &StudyDef,
    removal_factors: &[RemovalFactorDef],
) -> AppResult<PipelineConfig> {
    let p = &study.policy;
    let policy = MitigationPolicy {
        bank_erosion_percent: p.bank_erosion_percent,
        ag_threshold_percent: p.ag_threshold_percent,
        clay_threshold_percent: p.clay_threshold_percent,
        coverage_thresholds: CoverageThresholds {
            low_upper: p.coverage_thresholds.low_upper,
            medium_upper: p.coverage_thresholds.medium_upper,
        },
        surface_only_fraction: p.surface_only_fraction,
        bypass: p
            .bypass
            .iter()
            .map(|b| BypassRule {
                pathway: b.pathway,
                fraction: b.fraction,
            })
            .collect(),
        pathway_sum_tolerance: p.tolerances.pathway_sum,
    };
    policy.validate()?;

    let splits = FractionSplits::from_percentages(
        per_fraction(&study.fraction_splits),
        p.tolerances.fraction_sum,
    )?;

    let rows = removal_factors
        .iter()
        .map(|row| {
            let category = CoverageCategory::from_ext_code(row.ext_code).ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "Removal factor extent code {} is not 1, 2 or 3",
                    row.ext_code
                ))
            })?;
            Ok(RemovalFactorRow {
                category,
                pathway: row.pathway,
                remaining_percent: PerFraction::from_fn(|f| match f {
                    ChemicalFraction::Particulate => row.part_p,
                    ChemicalFraction::DissolvedReactive => row.drp,
                    ChemicalFraction::DissolvedOrganic => row.dop,
                }),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;
    let table = RemovalFactorTable::from_rows(rows)?;

    let routing = RoutingPolicy {
        default_attenuation: p.default_attenuation,
        convention: match p.attenuation_convention {
            AttenuationConventionDef::Receiving => AttenuationConvention::Receiving,
            AttenuationConventionDef::Upstream => AttenuationConvention::Upstream,
        },
    };
    routing.validate()?;

    Ok(PipelineConfig {
        policy,
        splits,
        table,
        routing,
        variants: study.coverage_variants.iter().map(|v| v.id.clone()).collect(),
        pre_inundation: study.inundation_comparison,
    })
}

fn per_fraction(def: &FractionSplitsDef) -> PerFraction<Real> {
    PerFraction::from_fn(|f| match f {
        ChemicalFraction::Particulate => def.part_p,
        ChemicalFraction::DissolvedReactive => def.drp,
        ChemicalFraction::DissolvedOrganic => def.dop,
    })
}

/// Build and validate the reach network from edge rows.
pub fn build_network(edges: &[EdgeRow]) -> AppResult<ReachNetwork> {
    let network = NetworkBuilder::from_edges(edges.iter().map(|e| ReachEdge {
        reach: ReachId(e.reach_id),
        hydseq: e.hydseq,
        from_node: e.from_node,
        to_node: e.to_node,
    }))
    .build()?;
    Ok(network)
}

/// Compile a study and its loaded input tables.
///
/// Every reach in the reach table must exist in the network. Network
/// reaches without a table row are allowed; the pipeline gives them zero
/// local load.
pub fn compile_study(study: &StudyDef, inputs: StudyInputs) -> AppResult<CompiledStudy> {
    let config = compile_config(study, &inputs.removal_factors)?;
    let network = build_network(&inputs.edges)?;
    let store = ReachAttributeStore::from_records(inputs.reaches, config.policy.pathway_sum_tolerance)?;

    if let Some(attrs) = store.iter().find(|a| !network.contains(a.id)) {
        return Err(NetworkError::ReachNotFound { reach: attrs.id }.into());
    }

    Ok(CompiledStudy {
        config,
        store,
        network,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_core::{Pathway, ReachAttributes};
    use tp_project::{CoverageVariantDef, InputsDef, PolicyDef};

    fn study() -> StudyDef {
        StudyDef {
            version: 1,
            name: "compile".to_string(),
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
            inundation_comparison: true,
        }
    }

    fn edge(reach_id: u64, hydseq: i64, from_node: u64, to_node: u64) -> EdgeRow {
        EdgeRow {
            reach_id,
            hydseq,
            from_node,
            to_node,
        }
    }

    #[test]
    fn defaults_compile() {
        let factors = vec![RemovalFactorDef {
            ext_code: 2,
            pathway: Pathway::SurfaceRunoff,
            part_p: 60.0,
            drp: 70.0,
            dop: 80.0,
        }];
        let config = compile_config(&study(), &factors).unwrap();
        assert_eq!(config.variants, vec!["surface_gw".to_string()]);
        assert!(config.pre_inundation);
        assert_eq!(config.routing.default_attenuation, 0.90);
        assert_eq!(
            config.table.remaining(
                CoverageCategory::Medium,
                Pathway::SurfaceRunoff,
                ChemicalFraction::DissolvedReactive
            ),
            Some(0.70)
        );
        assert_eq!(config.splits.share(ChemicalFraction::Particulate), 0.5);
    }

    #[test]
    fn bad_fraction_split_is_rejected() {
        let mut s = study();
        s.fraction_splits.drp = 30.0;
        assert!(matches!(compile_config(&s, &[]), Err(AppError::Compile(_))));
    }

    #[test]
    fn table_reach_missing_from_network_is_an_error() {
        let inputs = StudyInputs {
            reaches: vec![ReachAttributes::new(1, 5.0), ReachAttributes::new(99, 1.0)],
            edges: vec![edge(1, 1, 0, 1)],
            removal_factors: vec![],
            files: vec![],
        };
        let err = compile_study(&study(), inputs).unwrap_err();
        assert!(matches!(err, AppError::Network(msg) if msg.contains("99")));
    }

    #[test]
    fn network_reach_without_row_is_allowed() {
        let inputs = StudyInputs {
            reaches: vec![ReachAttributes::new(1, 5.0)],
            edges: vec![edge(1, 1, 0, 1), edge(2, 2, 1, 2)],
            removal_factors: vec![],
            files: vec![],
        };
        let compiled = compile_study(&study(), inputs).unwrap();
        assert_eq!(compiled.network.len(), 2);
        assert_eq!(compiled.store.len(), 1);
    }
}
