//! Immutable per-reach input attributes.
//!
//! Records are read once at the input boundary and never mutated; every
//! derived quantity lives in a separate output structure.

use std::collections::{BTreeMap, HashMap};

use crate::error::{TpError, TpResult};
use crate::ids::ReachId;
use crate::numeric::{Real, ensure_finite, percent_to_fraction};
use crate::phosphorus::{Pathway, PerPathway};

/// Per-reach pathway shares (fractions, summing to ~1).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathwaySplit(PerPathway<Real>);

impl PathwaySplit {
    pub fn from_shares(shares: PerPathway<Real>) -> Self {
        Self(shares)
    }

    /// Build from percentages in 0..=100.
    pub fn from_percentages(percent: PerPathway<Real>) -> Self {
        Self(percent.map(|_, v| percent_to_fraction(*v)))
    }

    /// Documented fallback for reaches without pathway data: equal shares
    /// across every pathway except tile drainage, which gets zero.
    pub fn fallback() -> Self {
        let open = (Pathway::COUNT - 1) as Real;
        Self(PerPathway::from_fn(|p| match p {
            Pathway::TileDrainage => 0.0,
            _ => 1.0 / open,
        }))
    }

    pub fn share(&self, pathway: Pathway) -> Real {
        self.0[pathway]
    }

    pub fn shares(&self) -> &PerPathway<Real> {
        &self.0
    }

    pub fn total(&self) -> Real {
        self.0.sum()
    }

    /// Shares rescaled to sum to exactly one. A split accepted within the
    /// pathway tolerance is rescaled here before any load is divided by it.
    /// An all-zero split is returned unchanged.
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if total > 0.0 {
            Self(self.0.map(|_, v| *v / total))
        } else {
            *self
        }
    }
}

/// Input attributes of one reach.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReachAttributes {
    pub id: ReachId,
    /// Gross generated TP load with the raised lake level (t/y).
    pub gross_load: Real,
    /// Gross generated TP load before the lake-level rise (t/y).
    pub pre_inundation_load: Option<Real>,
    pub ag_percent: Option<Real>,
    pub clay_percent: Option<Real>,
    pub pathway_split: Option<PathwaySplit>,
    /// CW coverage percent keyed by coverage variant id.
    pub coverage: BTreeMap<String, Real>,
    /// Fraction of incoming load surviving transport through this reach.
    pub attenuation: Option<Real>,
}

impl ReachAttributes {
    pub fn new(id: impl Into<ReachId>, gross_load: Real) -> Self {
        Self {
            id: id.into(),
            gross_load,
            pre_inundation_load: None,
            ag_percent: None,
            clay_percent: None,
            pathway_split: None,
            coverage: BTreeMap::new(),
            attenuation: None,
        }
    }

    pub fn with_pre_inundation_load(mut self, load: Real) -> Self {
        self.pre_inundation_load = Some(load);
        self
    }

    pub fn with_ag_percent(mut self, percent: Real) -> Self {
        self.ag_percent = Some(percent);
        self
    }

    pub fn with_clay_percent(mut self, percent: Real) -> Self {
        self.clay_percent = Some(percent);
        self
    }

    pub fn with_pathway_split(mut self, split: PathwaySplit) -> Self {
        self.pathway_split = Some(split);
        self
    }

    pub fn with_coverage(mut self, variant: impl Into<String>, percent: Real) -> Self {
        self.coverage.insert(variant.into(), percent);
        self
    }

    pub fn with_attenuation(mut self, factor: Real) -> Self {
        self.attenuation = Some(factor);
        self
    }

    pub fn coverage_for(&self, variant: &str) -> Option<Real> {
        self.coverage.get(variant).copied()
    }

    /// Structural checks: finite non-negative numbers, percentages in range,
    /// pathway shares summing to one within `pathway_tol`.
    pub fn check(&self, pathway_tol: Real) -> TpResult<()> {
        ensure_non_negative(self.gross_load, "gross_load")?;
        if let Some(v) = self.pre_inundation_load {
            ensure_non_negative(v, "pre_inundation_load")?;
        }
        for (value, what) in [
            (self.ag_percent, "ag_percent"),
            (self.clay_percent, "clay_percent"),
        ] {
            if let Some(v) = value {
                ensure_percent(v, what)?;
            }
        }
        for v in self.coverage.values() {
            ensure_percent(*v, "coverage percent")?;
        }
        if let Some(a) = self.attenuation {
            ensure_finite(a, "attenuation")?;
            if !(0.0..=1.0).contains(&a) {
                return Err(TpError::InvalidArg {
                    what: "attenuation must lie in [0, 1]",
                });
            }
        }
        if let Some(split) = &self.pathway_split {
            for (_, share) in split.shares().iter() {
                ensure_non_negative(*share, "pathway share")?;
            }
            let total = split.total();
            if (total - 1.0).abs() > pathway_tol {
                return Err(TpError::SumMismatch {
                    what: format!("pathway shares of reach {}", self.id),
                    expected: 1.0,
                    actual: total,
                });
            }
        }
        Ok(())
    }
}

fn ensure_non_negative(v: Real, what: &'static str) -> TpResult<Real> {
    let v = ensure_finite(v, what)?;
    if v < 0.0 {
        return Err(TpError::InvalidArg { what });
    }
    Ok(v)
}

fn ensure_percent(v: Real, what: &'static str) -> TpResult<Real> {
    let v = ensure_non_negative(v, what)?;
    if v > 100.0 {
        return Err(TpError::InvalidArg { what });
    }
    Ok(v)
}

/// Immutable table of reach attributes with O(1) lookup by reach id.
#[derive(Clone, Debug, Default)]
pub struct ReachAttributeStore {
    reaches: Vec<ReachAttributes>,
    by_id: HashMap<ReachId, usize>,
}

impl ReachAttributeStore {
    /// Validate and freeze a set of reach records.
    pub fn from_records(records: Vec<ReachAttributes>, pathway_tol: Real) -> TpResult<Self> {
        let mut by_id = HashMap::with_capacity(records.len());
        for (i, reach) in records.iter().enumerate() {
            reach.check(pathway_tol)?;
            if by_id.insert(reach.id, i).is_some() {
                return Err(TpError::DuplicateReach {
                    reach: reach.id,
                    context: "reach attribute table",
                });
            }
        }
        Ok(Self {
            reaches: records,
            by_id,
        })
    }

    pub fn get(&self, id: ReachId) -> Option<&ReachAttributes> {
        self.by_id.get(&id).map(|&i| &self.reaches[i])
    }

    pub fn contains(&self, id: ReachId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReachAttributes> {
        self.reaches.iter()
    }

    pub fn as_slice(&self) -> &[ReachAttributes] {
        &self.reaches
    }

    pub fn len(&self) -> usize {
        self.reaches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reaches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(sr: Real, td: Real, i: Real, sg: Real, dg: Real) -> PathwaySplit {
        PathwaySplit::from_percentages(PerPathway([sr, td, i, sg, dg]))
    }

    #[test]
    fn fallback_split_skips_tile_drainage() {
        let s = PathwaySplit::fallback();
        assert_eq!(s.share(Pathway::TileDrainage), 0.0);
        assert!((s.total() - 1.0).abs() < 1e-12);
        assert!((s.share(Pathway::SurfaceRunoff) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn split_within_tolerance_normalizes_to_one() {
        let s = split(40.0, 20.0, 20.0, 10.0, 9.5);
        assert!((s.total() - 0.995).abs() < 1e-12);
        let n = s.normalized();
        assert!((n.total() - 1.0).abs() < 1e-12);
        assert!((n.share(Pathway::SurfaceRunoff) - 0.4 / 0.995).abs() < 1e-12);
        assert_eq!(PathwaySplit::from_shares(PerPathway([0.0; 5])).normalized().total(), 0.0);
    }

    #[test]
    fn store_rejects_duplicates() {
        let recs = vec![ReachAttributes::new(1, 1.0), ReachAttributes::new(1, 2.0)];
        let err = ReachAttributeStore::from_records(recs, 0.01).unwrap_err();
        assert!(matches!(err, TpError::DuplicateReach { .. }));
    }

    #[test]
    fn store_rejects_bad_pathway_sum() {
        let recs = vec![ReachAttributes::new(7, 1.0).with_pathway_split(split(50.0, 10.0, 10.0, 10.0, 10.0))];
        let err = ReachAttributeStore::from_records(recs, 0.01).unwrap_err();
        match err {
            TpError::SumMismatch { actual, .. } => assert!((actual - 0.9).abs() < 1e-12),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn store_lookup() {
        let recs = vec![
            ReachAttributes::new(10, 1.0).with_clay_percent(20.0),
            ReachAttributes::new(11, 2.0).with_coverage("surface_gw", 3.0),
        ];
        let store = ReachAttributeStore::from_records(recs, 0.01).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(ReachId(11)).unwrap().coverage_for("surface_gw"), Some(3.0));
        assert!(store.get(ReachId(12)).is_none());
    }

    proptest::proptest! {
        #[test]
        fn percentages_that_sum_to_100_pass_the_check(
            a in 0.0f64..100.0,
            b in 0.0f64..1.0,
            c in 0.0f64..1.0,
            d in 0.0f64..1.0,
        ) {
            // Spread the remainder over the other four pathways.
            let rest = 100.0 - a;
            let w = [b, c, d, 1.0];
            let total: Real = w.iter().sum();
            let s = split(a, rest * w[0] / total, rest * w[1] / total, rest * w[2] / total, rest * w[3] / total);
            proptest::prop_assert!((s.total() - 1.0).abs() < 1e-9);
            let r = ReachAttributes::new(1, 1.0).with_pathway_split(s);
            proptest::prop_assert!(r.check(0.01).is_ok());
        }
    }

    #[test]
    fn attenuation_out_of_range_is_rejected() {
        let r = ReachAttributes::new(1, 1.0).with_attenuation(1.5);
        assert!(r.check(0.01).is_err());
    }
}
