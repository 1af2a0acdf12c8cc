//! Per-reach mitigation over a whole attribute store.

use rayon::prelude::*;
use tp_core::{DefaultApplied, Diagnostics, ReachAttributeStore, ReachAttributes, ReachId, Real};

use crate::applier::{MitigatedLoad, MitigationApplier};
use crate::fractions::FractionSplits;
use crate::policy::MitigationPolicy;
use crate::removal::RemovalFactorTable;
use crate::splitter::{AvailableLoad, LoadFractionSplitter, SplitLoad};

/// Everything derived for one reach before routing.
#[derive(Clone, Debug, PartialEq)]
pub struct ReachMitigation {
    pub reach: ReachId,
    pub available: AvailableLoad,
    /// Present only when the inundation comparison is requested.
    pub pre_inundation: Option<AvailableLoad>,
    /// Clay percent as used (0 when missing).
    pub clay_percent: Real,
    pub split: SplitLoad,
    /// One entry per coverage variant, in configured order.
    pub variants: Vec<(String, MitigatedLoad)>,
}

impl ReachMitigation {
    /// Generated load without wetlands.
    pub fn baseline_load(&self) -> Real {
        self.available.available
    }

    pub fn variant(&self, id: &str) -> Option<&MitigatedLoad> {
        self.variants
            .iter()
            .find(|(v, _)| v == id)
            .map(|(_, load)| load)
    }
}

/// Scenario request handed to the engine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MitigationRequest<'a> {
    pub variants: &'a [String],
    pub pre_inundation: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct MitigationEngine<'a> {
    splitter: LoadFractionSplitter<'a>,
    applier: MitigationApplier<'a>,
}

impl<'a> MitigationEngine<'a> {
    pub fn new(
        policy: &'a MitigationPolicy,
        splits: &'a FractionSplits,
        table: &'a RemovalFactorTable,
    ) -> Self {
        Self {
            splitter: LoadFractionSplitter::new(policy, splits),
            applier: MitigationApplier::new(policy, table),
        }
    }

    pub fn splitter(&self) -> &LoadFractionSplitter<'a> {
        &self.splitter
    }

    pub fn applier(&self) -> &MitigationApplier<'a> {
        &self.applier
    }

    pub fn mitigate_reach(
        &self,
        attrs: &ReachAttributes,
        request: &MitigationRequest<'_>,
    ) -> (ReachMitigation, Diagnostics) {
        let mut diags = Diagnostics::new();
        let reach = attrs.id;

        if attrs.ag_percent.is_none() {
            diags.default_applied(DefaultApplied::MissingAgPercent { reach });
        }
        let available = self
            .splitter
            .available_load(attrs.gross_load, attrs.ag_percent);

        let pre_inundation = request.pre_inundation.then(|| {
            let gross = attrs.pre_inundation_load.unwrap_or_else(|| {
                diags.default_applied(DefaultApplied::MissingPreInundationLoad { reach });
                attrs.gross_load
            });
            self.splitter.available_load(gross, attrs.ag_percent)
        });

        let split = self.splitter.split(
            reach,
            available.available,
            attrs.pathway_split.as_ref(),
            &mut diags,
        );

        let clay_percent = match attrs.clay_percent {
            Some(c) => c,
            None => {
                if !request.variants.is_empty() {
                    diags.default_applied(DefaultApplied::MissingClay { reach });
                }
                0.0
            }
        };

        let variants = request
            .variants
            .iter()
            .map(|variant| {
                let coverage = attrs.coverage_for(variant).unwrap_or_else(|| {
                    diags.default_applied(DefaultApplied::MissingCoverage {
                        reach,
                        variant: variant.clone(),
                    });
                    0.0
                });
                let load = self
                    .applier
                    .apply(reach, &split, coverage, clay_percent, &mut diags);
                (variant.clone(), load)
            })
            .collect();

        (
            ReachMitigation {
                reach,
                available,
                pre_inundation,
                clay_percent,
                split,
                variants,
            },
            diags,
        )
    }

    /// Mitigate every reach in store order. Reaches are independent, so the
    /// work is spread over the rayon pool; output order matches the store.
    pub fn mitigate_all(
        &self,
        store: &ReachAttributeStore,
        request: &MitigationRequest<'_>,
    ) -> (Vec<ReachMitigation>, Diagnostics) {
        let (reaches, diags): (Vec<_>, Vec<_>) = store
            .as_slice()
            .par_iter()
            .map(|attrs| self.mitigate_reach(attrs, request))
            .unzip();
        (reaches, diags.into_iter().collect())
    }
}
