//! Run diagnostics: defaults applied for missing optional data and
//! post-hoc validation flags.
//!
//! Stage functions never fail on missing optional inputs. They apply the
//! documented default and push a [`DefaultApplied`] entry here so the run
//! summary can report every occurrence.

use std::collections::BTreeMap;
use std::fmt;

use crate::ids::ReachId;
use crate::numeric::Real;
use crate::phosphorus::{ChemicalFraction, CoverageCategory, Pathway};

/// A documented default that replaced missing input data.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind"))]
pub enum DefaultApplied {
    /// Pathway shares missing; equal split over non-tile-drain pathways used.
    MissingPathwaySplit { reach: ReachId },
    /// No removal factor for the key; no removal applied.
    MissingRemovalFactor {
        reach: ReachId,
        category: CoverageCategory,
        pathway: Pathway,
        fraction: ChemicalFraction,
    },
    /// Attenuation missing; the policy default factor used.
    MissingAttenuation { reach: ReachId, applied: Real },
    /// Clay percent missing; treated as 0 (no clay override).
    MissingClay { reach: ReachId },
    /// Agricultural percent missing; land-use filter not applied.
    MissingAgPercent { reach: ReachId },
    /// Coverage for a variant missing; treated as 0 (no wetlands).
    MissingCoverage { reach: ReachId, variant: String },
    /// Pre-inundation load missing; gross load used.
    MissingPreInundationLoad { reach: ReachId },
    /// Reach is in the network but has no attribute row; zero local load.
    ReachWithoutAttributes { reach: ReachId },
}

impl DefaultApplied {
    pub fn kind(&self) -> &'static str {
        match self {
            DefaultApplied::MissingPathwaySplit { .. } => "missing_pathway_split",
            DefaultApplied::MissingRemovalFactor { .. } => "missing_removal_factor",
            DefaultApplied::MissingAttenuation { .. } => "missing_attenuation",
            DefaultApplied::MissingClay { .. } => "missing_clay",
            DefaultApplied::MissingAgPercent { .. } => "missing_ag_percent",
            DefaultApplied::MissingCoverage { .. } => "missing_coverage",
            DefaultApplied::MissingPreInundationLoad { .. } => "missing_pre_inundation_load",
            DefaultApplied::ReachWithoutAttributes { .. } => "reach_without_attributes",
        }
    }
}

/// A computed result that is logically impossible under correct policy.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind"))]
pub enum ValidationFlag {
    MitigatedExceedsBaseline {
        reach: ReachId,
        scenario: String,
        stage: LoadStage,
        baseline: Real,
        mitigated: Real,
    },
    ReductionOverHundredPercent {
        reach: ReachId,
        scenario: String,
        percent: Real,
    },
    NegativeLoad {
        reach: ReachId,
        scenario: String,
        stage: LoadStage,
        value: Real,
    },
}

impl ValidationFlag {
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationFlag::MitigatedExceedsBaseline { .. } => "mitigated_exceeds_baseline",
            ValidationFlag::ReductionOverHundredPercent { .. } => "reduction_over_100_percent",
            ValidationFlag::NegativeLoad { .. } => "negative_load",
        }
    }
}

/// Whether a value refers to a reach's own load or its accumulated load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LoadStage {
    Generated,
    Routed,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStage::Generated => f.write_str("generated"),
            LoadStage::Routed => f.write_str("routed"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    Default(DefaultApplied),
    Flag(ValidationFlag),
}

/// Tally of diagnostics by kind, for run summaries.
pub type DiagnosticCounts = BTreeMap<&'static str, usize>;

/// Collected diagnostics of one stage or one run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
    defaults: Vec<DefaultApplied>,
    flags: Vec<ValidationFlag>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_applied(&mut self, d: DefaultApplied) {
        self.defaults.push(d);
    }

    pub fn flag(&mut self, f: ValidationFlag) {
        self.flags.push(f);
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.defaults.extend(other.defaults);
        self.flags.extend(other.flags);
    }

    pub fn defaults(&self) -> &[DefaultApplied] {
        &self.defaults
    }

    pub fn flags(&self) -> &[ValidationFlag] {
        &self.flags
    }

    pub fn is_clean(&self) -> bool {
        self.defaults.is_empty() && self.flags.is_empty()
    }

    pub fn default_counts(&self) -> DiagnosticCounts {
        let mut counts = DiagnosticCounts::new();
        for d in &self.defaults {
            *counts.entry(d.kind()).or_default() += 1;
        }
        counts
    }

    pub fn flag_counts(&self) -> DiagnosticCounts {
        let mut counts = DiagnosticCounts::new();
        for f in &self.flags {
            *counts.entry(f.kind()).or_default() += 1;
        }
        counts
    }

    pub fn iter(&self) -> impl Iterator<Item = Diagnostic> + '_ {
        self.defaults
            .iter()
            .cloned()
            .map(Diagnostic::Default)
            .chain(self.flags.iter().cloned().map(Diagnostic::Flag))
    }
}

impl FromIterator<Diagnostics> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostics>>(iter: I) -> Self {
        let mut all = Diagnostics::new();
        for d in iter {
            all.merge(d);
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_kind() {
        let mut d = Diagnostics::new();
        d.default_applied(DefaultApplied::MissingClay { reach: ReachId(1) });
        d.default_applied(DefaultApplied::MissingClay { reach: ReachId(2) });
        d.default_applied(DefaultApplied::MissingAttenuation {
            reach: ReachId(2),
            applied: 0.9,
        });
        let counts = d.default_counts();
        assert_eq!(counts.get("missing_clay"), Some(&2));
        assert_eq!(counts.get("missing_attenuation"), Some(&1));
        assert!(d.flag_counts().is_empty());
        assert!(!d.is_clean());
    }

    #[test]
    fn merge_and_collect() {
        let mut a = Diagnostics::new();
        a.default_applied(DefaultApplied::MissingAgPercent { reach: ReachId(3) });
        let mut b = Diagnostics::new();
        b.flag(ValidationFlag::ReductionOverHundredPercent {
            reach: ReachId(3),
            scenario: "surface_gw".into(),
            percent: 120.0,
        });
        let all: Diagnostics = vec![a, b].into_iter().collect();
        assert_eq!(all.defaults().len(), 1);
        assert_eq!(all.flags().len(), 1);
        assert_eq!(all.iter().count(), 2);
    }
}
