//! Mitigation policy constants, held in one immutable value.

use serde::{Deserialize, Serialize};
use tp_core::{ChemicalFraction, CoverageCategory, Pathway, Real, percent_to_fraction};

use crate::error::{MitigationError, MitigationResult};

/// Coverage thresholds separating the three coverage categories.
///
/// - `coverage < low_upper` is `Low`
/// - `low_upper <= coverage <= medium_upper` is `Medium`
/// - `coverage > medium_upper` is `High`
///
/// Coverage of zero or less means no wetland at all and has no category.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoverageThresholds {
    pub low_upper: Real,
    pub medium_upper: Real,
}

impl Default for CoverageThresholds {
    fn default() -> Self {
        Self {
            low_upper: 2.0,
            medium_upper: 4.0,
        }
    }
}

impl CoverageThresholds {
    pub fn classify(&self, coverage_percent: Real) -> Option<CoverageCategory> {
        if coverage_percent <= 0.0 || coverage_percent.is_nan() {
            None
        } else if coverage_percent < self.low_upper {
            Some(CoverageCategory::Low)
        } else if coverage_percent <= self.medium_upper {
            Some(CoverageCategory::Medium)
        } else {
            Some(CoverageCategory::High)
        }
    }
}

/// A (pathway, fraction) combination that wetlands never treat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BypassRule {
    pub pathway: Pathway,
    pub fraction: ChemicalFraction,
}

/// Policy values shared by the splitter and the applier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MitigationPolicy {
    /// Share of each fraction attributed to bank erosion (never treated).
    pub bank_erosion_percent: Real,
    /// Below this agricultural share only the agricultural part of the gross load is available.
    pub ag_threshold_percent: Real,
    /// Wetlands are ineffective on soils with clay above this.
    pub clay_threshold_percent: Real,
    pub coverage_thresholds: CoverageThresholds,
    /// Fraction routed entirely through surface runoff.
    pub surface_only_fraction: Option<ChemicalFraction>,
    pub bypass: Vec<BypassRule>,
    /// Allowed deviation of per-reach pathway shares from 1.
    pub pathway_sum_tolerance: Real,
}

impl Default for MitigationPolicy {
    fn default() -> Self {
        Self {
            bank_erosion_percent: 50.0,
            ag_threshold_percent: 25.0,
            clay_threshold_percent: 50.0,
            coverage_thresholds: CoverageThresholds::default(),
            surface_only_fraction: Some(ChemicalFraction::Particulate),
            bypass: vec![
                BypassRule {
                    pathway: Pathway::DeepGroundwater,
                    fraction: ChemicalFraction::DissolvedReactive,
                },
                BypassRule {
                    pathway: Pathway::DeepGroundwater,
                    fraction: ChemicalFraction::DissolvedOrganic,
                },
            ],
            pathway_sum_tolerance: 0.01,
        }
    }
}

impl MitigationPolicy {
    pub fn bank_erosion_share(&self) -> Real {
        percent_to_fraction(self.bank_erosion_percent)
    }

    pub fn is_bypass(&self, pathway: Pathway, fraction: ChemicalFraction) -> bool {
        self.bypass
            .iter()
            .any(|b| b.pathway == pathway && b.fraction == fraction)
    }

    pub fn clay_override(&self, clay_percent: Real) -> bool {
        clay_percent > self.clay_threshold_percent
    }

    pub fn validate(&self) -> MitigationResult<()> {
        for (value, name) in [
            (self.bank_erosion_percent, "bank_erosion_percent"),
            (self.ag_threshold_percent, "ag_threshold_percent"),
            (self.clay_threshold_percent, "clay_threshold_percent"),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(MitigationError::InvalidPolicy {
                    what: format!("{name} = {value} is outside 0..=100"),
                });
            }
        }
        let t = self.coverage_thresholds;
        if !(t.low_upper.is_finite() && t.medium_upper.is_finite())
            || t.low_upper <= 0.0
            || t.low_upper > t.medium_upper
        {
            return Err(MitigationError::InvalidPolicy {
                what: format!(
                    "coverage thresholds must satisfy 0 < low_upper <= medium_upper (got {} and {})",
                    t.low_upper, t.medium_upper
                ),
            });
        }
        if !(self.pathway_sum_tolerance >= 0.0 && self.pathway_sum_tolerance < 1.0) {
            return Err(MitigationError::InvalidPolicy {
                what: format!(
                    "pathway_sum_tolerance = {} must lie in [0, 1)",
                    self.pathway_sum_tolerance
                ),
            });
        }
        Ok(())
    }
}
