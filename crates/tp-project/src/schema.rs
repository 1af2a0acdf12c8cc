//! Study file schema definitions.

use serde::{Deserialize, Serialize};
use tp_core::{ChemicalFraction, Pathway};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudyDef {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub policy: PolicyDef,
    #[serde(default)]
    pub fraction_splits: FractionSplitsDef,
    #[serde(default)]
    pub coverage_variants: Vec<CoverageVariantDef>,
    /// Inline removal factor rows. Rows from `inputs.removal_factors` are appended.
    #[serde(default)]
    pub removal_factors: Vec<RemovalFactorDef>,
    pub inputs: InputsDef,
    #[serde(default)]
    pub inundation_comparison: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PolicyDef {
    pub bank_erosion_percent: f64,
    pub ag_threshold_percent: f64,
    pub clay_threshold_percent: f64,
    pub coverage_thresholds: CoverageThresholdsDef,
    pub default_attenuation: f64,
    pub attenuation_convention: AttenuationConventionDef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_only_fraction: Option<ChemicalFraction>,
    pub bypass: Vec<BypassDef>,
    pub tolerances: TolerancesDef,
}

impl Default for PolicyDef {
    fn default() -> Self {
        Self {
            bank_erosion_percent: 50.0,
            ag_threshold_percent: 25.0,
            clay_threshold_percent: 50.0,
            coverage_thresholds: CoverageThresholdsDef::default(),
            default_attenuation: 0.90,
            attenuation_convention: AttenuationConventionDef::Receiving,
            surface_only_fraction: Some(ChemicalFraction::Particulate),
            bypass: vec![
                BypassDef {
                    pathway: Pathway::DeepGroundwater,
                    fraction: ChemicalFraction::DissolvedReactive,
                },
                BypassDef {
                    pathway: Pathway::DeepGroundwater,
                    fraction: ChemicalFraction::DissolvedOrganic,
                },
            ],
            tolerances: TolerancesDef::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CoverageThresholdsDef {
    pub low_upper: f64,
    pub medium_upper: f64,
}

impl Default for CoverageThresholdsDef {
    fn default() -> Self {
        Self {
            low_upper: 2.0,
            medium_upper: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttenuationConventionDef {
    #[default]
    Receiving,
    Upstream,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BypassDef {
    pub pathway: Pathway,
    pub fraction: ChemicalFraction,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TolerancesDef {
    /// Allowed deviation of fraction splits from 100, in percent.
    pub fraction_sum: f64,
    /// Allowed deviation of per-reach pathway shares from 1.
    pub pathway_sum: f64,
}

impl Default for TolerancesDef {
    fn default() -> Self {
        Self {
            fraction_sum: 1e-6,
            pathway_sum: 0.01,
        }
    }
}

/// Chemical fraction shares in percent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FractionSplitsDef {
    #[serde(rename = "PartP")]
    pub part_p: f64,
    #[serde(rename = "DRP")]
    pub drp: f64,
    #[serde(rename = "DOP")]
    pub dop: f64,
}

impl Default for FractionSplitsDef {
    fn default() -> Self {
        Self {
            part_p: 50.0,
            drp: 25.0,
            dop: 25.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoverageVariantDef {
    pub id: String,
    pub name: String,
}

impl CoverageVariantDef {
    /// Reach table column holding this variant's coverage percent.
    pub fn column(&self) -> String {
        format!("cw_{}", self.id)
    }
}

/// Percent REMAINING per chemical fraction for one (extent code, pathway).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RemovalFactorDef {
    pub ext_code: u8,
    pub pathway: Pathway,
    #[serde(rename = "PartP")]
    pub part_p: f64,
    #[serde(rename = "DRP")]
    pub drp: f64,
    #[serde(rename = "DOP")]
    pub dop: f64,
}

/// Input table paths, relative to the study file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InputsDef {
    pub reaches: String,
    pub edges: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removal_factors: Option<String>,
}
