//! Load fraction splitting: available load -> fractions -> bank erosion /
//! mitigable -> pathways.

use tp_core::{
    ChemicalFraction, DefaultApplied, Diagnostics, PathwaySplit, Pathway, PerFraction, PerPathway,
    ReachId, Real, percent_to_fraction,
};

use crate::fractions::FractionSplits;
use crate::policy::MitigationPolicy;

/// Load left after the agricultural land-use filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AvailableLoad {
    pub gross: Real,
    pub available: Real,
    pub ag_filter_applied: bool,
}

/// One chemical fraction of a reach's available load.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FractionLoad {
    pub total: Real,
    /// Bank-erosion share, never treated.
    pub bank_erosion: Real,
    /// Hillslope share, eligible for treatment.
    pub mitigable: Real,
    /// Mitigable share per pathway.
    pub pathways: PerPathway<Real>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitLoad {
    pub available: Real,
    pub fractions: PerFraction<FractionLoad>,
    /// True when the pathway fallback distribution was used.
    pub fallback_split: bool,
}

impl SplitLoad {
    pub fn bank_erosion_total(&self) -> Real {
        self.fractions.values().iter().map(|f| f.bank_erosion).sum()
    }

    pub fn mitigable_total(&self) -> Real {
        self.fractions.values().iter().map(|f| f.mitigable).sum()
    }

    pub fn fraction(&self, fraction: ChemicalFraction) -> &FractionLoad {
        &self.fractions[fraction]
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LoadFractionSplitter<'a> {
    policy: &'a MitigationPolicy,
    splits: &'a FractionSplits,
}

impl<'a> LoadFractionSplitter<'a> {
    pub fn new(policy: &'a MitigationPolicy, splits: &'a FractionSplits) -> Self {
        Self { policy, splits }
    }

    /// Apply the agricultural filter: below the threshold only the
    /// agricultural share of the gross load is available. Without an
    /// agricultural percentage the gross load passes unchanged.
    pub fn available_load(&self, gross: Real, ag_percent: Option<Real>) -> AvailableLoad {
        match ag_percent {
            Some(ag) if ag < self.policy.ag_threshold_percent => AvailableLoad {
                gross,
                available: gross * percent_to_fraction(ag),
                ag_filter_applied: true,
            },
            _ => AvailableLoad {
                gross,
                available: gross,
                ag_filter_applied: false,
            },
        }
    }

    /// Split an available load into fractions and pathways.
    ///
    /// Pathway shares are normalised to sum to one, so no load is created
    /// or lost. A missing pathway split falls back to
    /// [`PathwaySplit::fallback`] and records `MissingPathwaySplit`.
    pub fn split(
        &self,
        reach: ReachId,
        available: Real,
        pathway_split: Option<&PathwaySplit>,
        diagnostics: &mut Diagnostics,
    ) -> SplitLoad {
        let (shares, fallback_split) = match pathway_split {
            Some(split) => (split.normalized(), false),
            None => {
                diagnostics.default_applied(DefaultApplied::MissingPathwaySplit { reach });
                (PathwaySplit::fallback(), true)
            }
        };

        let bank_share = self.policy.bank_erosion_share();
        let fractions = PerFraction::from_fn(|fraction| {
            let total = available * self.splits.share(fraction);
            let bank_erosion = total * bank_share;
            let mitigable = total - bank_erosion;
            let pathways = if self.policy.surface_only_fraction == Some(fraction) {
                PerPathway::from_fn(|p| match p {
                    Pathway::SurfaceRunoff => mitigable,
                    _ => 0.0,
                })
            } else {
                PerPathway::from_fn(|p| mitigable * shares.share(p))
            };
            FractionLoad {
                total,
                bank_erosion,
                mitigable,
                pathways,
            }
        });

        SplitLoad {
            available,
            fractions,
            fallback_split,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_of(pct: [Real; 5]) -> PathwaySplit {
        PathwaySplit::from_percentages(PerPathway(pct))
    }

    #[test]
    fn ag_filter_below_threshold() {
        let policy = MitigationPolicy::default();
        let splits = FractionSplits::default();
        let s = LoadFractionSplitter::new(&policy, &splits);

        let low = s.available_load(200.0, Some(10.0));
        assert!(low.ag_filter_applied);
        assert!((low.available - 20.0).abs() < 1e-12);

        let at = s.available_load(200.0, Some(25.0));
        assert!(!at.ag_filter_applied);
        assert_eq!(at.available, 200.0);

        assert_eq!(s.available_load(200.0, None).available, 200.0);
    }

    #[test]
    fn particulate_goes_to_surface_runoff_only() {
        let policy = MitigationPolicy::default();
        let splits = FractionSplits::default();
        let s = LoadFractionSplitter::new(&policy, &splits);
        let mut diags = Diagnostics::new();
        let out = s.split(
            ReachId(1),
            100.0,
            Some(&split_of([40.0, 20.0, 20.0, 10.0, 10.0])),
            &mut diags,
        );

        let part = out.fraction(ChemicalFraction::Particulate);
        assert_eq!(part.total, 50.0);
        assert_eq!(part.bank_erosion, 25.0);
        assert_eq!(part.pathways[Pathway::SurfaceRunoff], 25.0);
        for p in [
            Pathway::TileDrainage,
            Pathway::Interflow,
            Pathway::ShallowGroundwater,
            Pathway::DeepGroundwater,
        ] {
            assert_eq!(part.pathways[p], 0.0);
        }

        let drp = out.fraction(ChemicalFraction::DissolvedReactive);
        assert!((drp.pathways[Pathway::SurfaceRunoff] - 5.0).abs() < 1e-12);
        assert!((drp.pathways[Pathway::DeepGroundwater] - 1.25).abs() < 1e-12);
        assert!(diags.is_clean());
    }

    #[test]
    fn missing_split_uses_fallback_and_records_it() {
        let policy = MitigationPolicy::default();
        let splits = FractionSplits::default();
        let s = LoadFractionSplitter::new(&policy, &splits);
        let mut diags = Diagnostics::new();
        let out = s.split(ReachId(9), 100.0, None, &mut diags);

        assert!(out.fallback_split);
        let dop = out.fraction(ChemicalFraction::DissolvedOrganic);
        assert_eq!(dop.pathways[Pathway::TileDrainage], 0.0);
        assert_eq!(dop.pathways[Pathway::Interflow], 3.125);
        assert_eq!(
            diags.defaults(),
            &[DefaultApplied::MissingPathwaySplit { reach: ReachId(9) }]
        );
    }

    #[test]
    fn split_within_tolerance_keeps_every_unit() {
        let policy = MitigationPolicy::default();
        let splits = FractionSplits::default();
        let s = LoadFractionSplitter::new(&policy, &splits);
        let out = s.split(
            ReachId(1),
            100.0,
            Some(&split_of([40.0, 20.0, 20.0, 10.0, 9.5])),
            &mut Diagnostics::new(),
        );
        for f in ChemicalFraction::ALL {
            let load = out.fraction(f);
            assert!((load.pathways.sum() - load.mitigable).abs() < 1e-12);
        }
    }

    #[test]
    fn zero_load_splits_to_zero() {
        let policy = MitigationPolicy::default();
        let splits = FractionSplits::default();
        let s = LoadFractionSplitter::new(&policy, &splits);
        let out = s.split(
            ReachId(1),
            0.0,
            Some(&split_of([20.0; 5])),
            &mut Diagnostics::new(),
        );
        assert_eq!(out.bank_erosion_total(), 0.0);
        assert_eq!(out.mitigable_total(), 0.0);
    }
}
