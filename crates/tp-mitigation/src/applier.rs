//! Effective removal per reach, pathway and fraction.

use tp_core::{
    ChemicalFraction, CoverageCategory, DefaultApplied, Diagnostics, Pathway, PerFraction,
    PerPathway, ReachId, Real,
};

use crate::policy::MitigationPolicy;
use crate::removal::RemovalFactorTable;
use crate::splitter::SplitLoad;

/// Which rule decided the remaining fraction of a pathway load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RemovalRule {
    /// Nothing to treat.
    #[default]
    NoLoad,
    ClayOverride,
    Bypass,
    /// Coverage is zero: no wetland present.
    NoWetland,
    Lookup,
    /// No table entry for the key; treated as no removal.
    MissingFactor,
}

impl RemovalRule {
    pub fn as_str(self) -> &'static str {
        match self {
            RemovalRule::NoLoad => "no_load",
            RemovalRule::ClayOverride => "clay_override",
            RemovalRule::Bypass => "bypass",
            RemovalRule::NoWetland => "no_wetland",
            RemovalRule::Lookup => "lookup",
            RemovalRule::MissingFactor => "missing_factor",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PathwayOutcome {
    pub input: Real,
    pub remaining_fraction: Real,
    pub removed: Real,
    pub remaining: Real,
    pub rule: RemovalRule,
}

/// Per-pathway loads summed over chemical fractions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PathwayTotals {
    pub input: Real,
    pub removed: Real,
    pub remaining: Real,
}

/// With-mitigation load of one reach under one coverage variant.
#[derive(Clone, Debug, PartialEq)]
pub struct MitigatedLoad {
    pub coverage_percent: Real,
    pub category: Option<CoverageCategory>,
    pub clay_override: bool,
    pub bank_erosion: Real,
    pub outcomes: PerFraction<PerPathway<PathwayOutcome>>,
    /// Bank erosion plus every remaining pathway load.
    pub with_mitigation: Real,
}

impl MitigatedLoad {
    pub fn removed_total(&self) -> Real {
        self.outcomes
            .values()
            .iter()
            .flat_map(|per| per.values().iter())
            .map(|o| o.removed)
            .sum()
    }

    pub fn mitigable_total(&self) -> Real {
        self.outcomes
            .values()
            .iter()
            .flat_map(|per| per.values().iter())
            .map(|o| o.input)
            .sum()
    }

    /// Removed share of the mitigable load (0 when nothing is mitigable).
    pub fn applied_removal_fraction(&self) -> Real {
        let mitigable = self.mitigable_total();
        if mitigable == 0.0 {
            0.0
        } else {
            self.removed_total() / mitigable
        }
    }

    pub fn pathway_totals(&self) -> PerPathway<PathwayTotals> {
        PerPathway::from_fn(|p| {
            let mut t = PathwayTotals::default();
            for per in self.outcomes.values() {
                t.input += per[p].input;
                t.removed += per[p].removed;
                t.remaining += per[p].remaining;
            }
            t
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MitigationApplier<'a> {
    policy: &'a MitigationPolicy,
    table: &'a RemovalFactorTable,
}

impl<'a> MitigationApplier<'a> {
    pub fn new(policy: &'a MitigationPolicy, table: &'a RemovalFactorTable) -> Self {
        Self { policy, table }
    }

    /// Remaining fraction for one pathway load.
    ///
    /// Precedence: clay override, bypass pathway, no wetland, table lookup.
    /// A missing table entry means no removal and records `MissingRemovalFactor`.
    pub fn remaining_fraction(
        &self,
        reach: ReachId,
        clay_override: bool,
        category: Option<CoverageCategory>,
        pathway: Pathway,
        fraction: ChemicalFraction,
        diagnostics: &mut Diagnostics,
    ) -> (Real, RemovalRule) {
        if clay_override {
            return (1.0, RemovalRule::ClayOverride);
        }
        if self.policy.is_bypass(pathway, fraction) {
            return (1.0, RemovalRule::Bypass);
        }
        let Some(category) = category else {
            return (1.0, RemovalRule::NoWetland);
        };
        match self.table.remaining(category, pathway, fraction) {
            Some(r) => (r, RemovalRule::Lookup),
            None => {
                diagnostics.default_applied(DefaultApplied::MissingRemovalFactor {
                    reach,
                    category,
                    pathway,
                    fraction,
                });
                (1.0, RemovalRule::MissingFactor)
            }
        }
    }

    pub fn apply(
        &self,
        reach: ReachId,
        split: &SplitLoad,
        coverage_percent: Real,
        clay_percent: Real,
        diagnostics: &mut Diagnostics,
    ) -> MitigatedLoad {
        let category = self.policy.coverage_thresholds.classify(coverage_percent);
        let clay_override = self.policy.clay_override(clay_percent);

        let outcomes = PerFraction::from_fn(|fraction| {
            let loads = &split.fractions[fraction].pathways;
            PerPathway::from_fn(|pathway| {
                let input = loads[pathway];
                if input == 0.0 {
                    return PathwayOutcome {
                        remaining_fraction: 1.0,
                        ..PathwayOutcome::default()
                    };
                }
                let (remaining_fraction, rule) = self.remaining_fraction(
                    reach,
                    clay_override,
                    category,
                    pathway,
                    fraction,
                    diagnostics,
                );
                let removed = input * (1.0 - remaining_fraction);
                PathwayOutcome {
                    input,
                    remaining_fraction,
                    removed,
                    remaining: input - removed,
                    rule,
                }
            })
        });

        let bank_erosion = split.bank_erosion_total();
        let with_mitigation = bank_erosion
            + outcomes
                .values()
                .iter()
                .flat_map(|per| per.values().iter())
                .map(|o| o.remaining)
                .sum::<Real>();

        MitigatedLoad {
            coverage_percent,
            category,
            clay_override,
            bank_erosion,
            outcomes,
            with_mitigation,
        }
    }
}
