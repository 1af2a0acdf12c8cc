//! Fixed chemical fraction shares.

use tp_core::{ChemicalFraction, PerFraction, Real, percent_to_fraction};

use crate::error::{MitigationError, MitigationResult};

/// Share of available load per chemical fraction, summing to one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractionSplits(PerFraction<Real>);

impl FractionSplits {
    /// Percentages must be non-negative and sum to 100 within `tolerance` percent.
    pub fn from_percentages(percent: PerFraction<Real>, tolerance: Real) -> MitigationResult<Self> {
        if percent.values().iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(MitigationError::InvalidPolicy {
                what: format!("fraction splits must be finite and non-negative: {percent:?}"),
            });
        }
        let total = percent.sum();
        if (total - 100.0).abs() > tolerance {
            return Err(MitigationError::FractionSum { actual: total });
        }
        Ok(Self(percent.map(|_, v| percent_to_fraction(*v))))
    }

    pub fn share(&self, fraction: ChemicalFraction) -> Real {
        self.0[fraction]
    }

    pub fn shares(&self) -> &PerFraction<Real> {
        &self.0
    }
}

impl Default for FractionSplits {
    /// PartP 50%, DRP 25%, DOP 25%.
    fn default() -> Self {
        Self(PerFraction([0.5, 0.25, 0.25]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_percentages() {
        let s = FractionSplits::from_percentages(PerFraction([50.0, 25.0, 25.0]), 1e-6).unwrap();
        assert_eq!(s, FractionSplits::default());
        assert_eq!(s.share(ChemicalFraction::DissolvedOrganic), 0.25);
    }

    #[test]
    fn bad_sum_is_rejected() {
        let err = FractionSplits::from_percentages(PerFraction([50.0, 25.0, 20.0]), 1e-6).unwrap_err();
        assert_eq!(err, MitigationError::FractionSum { actual: 95.0 });
    }

    #[test]
    fn negative_share_is_rejected() {
        assert!(FractionSplits::from_percentages(PerFraction([110.0, -5.0, -5.0]), 1e-6).is_err());
    }
}
