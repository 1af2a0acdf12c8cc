use crate::TpError;

/// Floating point type used throughout the pipeline (loads in t/y).
pub type Real = f64;

/// Absolute + relative tolerance pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

impl Tolerances {
    /// Tolerance used when checking that shares sum to one.
    pub const fn absolute(abs: Real) -> Self {
        Self { abs, rel: 0.0 }
    }
}

/// Negative values above this are treated as rounding noise in result checks.
pub const NEGATIVE_ROUNDING_TOLERANCE: Real = -1e-6;

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, TpError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TpError::NonFinite { what, value: v })
    }
}

/// Convert a percentage (0..=100) to a fraction (0..=1).
#[inline]
pub fn percent_to_fraction(percent: Real) -> Real {
    percent / 100.0
}

/// `part / whole * 100`, defined as 0 when `whole` is exactly zero.
pub fn percent_of(part: Real, whole: Real) -> Real {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}
