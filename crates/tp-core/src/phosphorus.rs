//! Closed domain enumerations: chemical fractions, flow pathways and
//! coverage categories, plus fixed-size per-fraction / per-pathway arrays.

use core::fmt;
use core::ops::{Index, IndexMut};
use core::str::FromStr;

use crate::error::TpError;
use crate::numeric::Real;

/// Phosphorus species category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChemicalFraction {
    /// Particulate P.
    #[cfg_attr(feature = "serde", serde(rename = "PartP"))]
    Particulate,
    /// Dissolved reactive P.
    #[cfg_attr(feature = "serde", serde(rename = "DRP"))]
    DissolvedReactive,
    /// Dissolved organic P.
    #[cfg_attr(feature = "serde", serde(rename = "DOP"))]
    DissolvedOrganic,
}

impl ChemicalFraction {
    pub const COUNT: usize = 3;
    pub const ALL: [ChemicalFraction; 3] = [
        ChemicalFraction::Particulate,
        ChemicalFraction::DissolvedReactive,
        ChemicalFraction::DissolvedOrganic,
    ];

    pub fn position(self) -> usize {
        self as usize
    }

    /// Short code used in input tables and output columns.
    pub fn code(self) -> &'static str {
        match self {
            ChemicalFraction::Particulate => "PartP",
            ChemicalFraction::DissolvedReactive => "DRP",
            ChemicalFraction::DissolvedOrganic => "DOP",
        }
    }
}

impl fmt::Display for ChemicalFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ChemicalFraction {
    type Err = TpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChemicalFraction::ALL
            .into_iter()
            .find(|f| f.code().eq_ignore_ascii_case(s.trim()))
            .ok_or(TpError::InvalidArg {
                what: "unknown chemical fraction code",
            })
    }
}

/// Flow-routing mechanism by which hillslope load reaches the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Pathway {
    #[cfg_attr(feature = "serde", serde(rename = "SR"))]
    SurfaceRunoff,
    #[cfg_attr(feature = "serde", serde(rename = "TD"))]
    TileDrainage,
    #[cfg_attr(feature = "serde", serde(rename = "IF"))]
    Interflow,
    #[cfg_attr(feature = "serde", serde(rename = "SG"))]
    ShallowGroundwater,
    #[cfg_attr(feature = "serde", serde(rename = "DG"))]
    DeepGroundwater,
}

impl Pathway {
    pub const COUNT: usize = 5;
    pub const ALL: [Pathway; 5] = [
        Pathway::SurfaceRunoff,
        Pathway::TileDrainage,
        Pathway::Interflow,
        Pathway::ShallowGroundwater,
        Pathway::DeepGroundwater,
    ];

    pub fn position(self) -> usize {
        self as usize
    }

    pub fn code(self) -> &'static str {
        match self {
            Pathway::SurfaceRunoff => "SR",
            Pathway::TileDrainage => "TD",
            Pathway::Interflow => "IF",
            Pathway::ShallowGroundwater => "SG",
            Pathway::DeepGroundwater => "DG",
        }
    }
}

impl fmt::Display for Pathway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Pathway {
    type Err = TpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pathway::ALL
            .into_iter()
            .find(|p| p.code().eq_ignore_ascii_case(s.trim()))
            .ok_or(TpError::InvalidArg {
                what: "unknown pathway code",
            })
    }
}

/// Ordered constructed-wetland coverage bin.
///
/// Extent codes: 1 = Low, 2 = Medium, 3 = High. This is the only mapping
/// between codes and categories used anywhere in the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CoverageCategory {
    Low,
    Medium,
    High,
}

impl CoverageCategory {
    pub const ALL: [CoverageCategory; 3] = [
        CoverageCategory::Low,
        CoverageCategory::Medium,
        CoverageCategory::High,
    ];

    pub fn ext_code(self) -> u8 {
        match self {
            CoverageCategory::Low => 1,
            CoverageCategory::Medium => 2,
            CoverageCategory::High => 3,
        }
    }

    pub fn from_ext_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(CoverageCategory::Low),
            2 => Some(CoverageCategory::Medium),
            3 => Some(CoverageCategory::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CoverageCategory::Low => "low",
            CoverageCategory::Medium => "medium",
            CoverageCategory::High => "high",
        }
    }
}

impl fmt::Display for CoverageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! keyed_array {
    ($(#[$meta:meta])* $name:ident, $key:ty, $n:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name<T>(pub [T; $n]);

        impl<T> $name<T> {
            pub fn from_fn(mut f: impl FnMut($key) -> T) -> Self {
                let keys = <$key>::ALL;
                Self(core::array::from_fn(|i| f(keys[i])))
            }

            pub fn iter(&self) -> impl Iterator<Item = ($key, &T)> {
                <$key>::ALL.into_iter().zip(self.0.iter())
            }

            pub fn map<U>(&self, mut f: impl FnMut($key, &T) -> U) -> $name<U> {
                $name::from_fn(|k| f(k, &self[k]))
            }

            pub fn values(&self) -> &[T; $n] {
                &self.0
            }
        }

        impl $name<Real> {
            pub fn sum(&self) -> Real {
                self.0.iter().sum()
            }
        }

        impl<T> Index<$key> for $name<T> {
            type Output = T;
            fn index(&self, key: $key) -> &T {
                &self.0[key.position()]
            }
        }

        impl<T> IndexMut<$key> for $name<T> {
            fn index_mut(&mut self, key: $key) -> &mut T {
                &mut self.0[key.position()]
            }
        }
    };
}

keyed_array!(
    /// One value per chemical fraction.
    PerFraction,
    ChemicalFraction,
    3
);

keyed_array!(
    /// One value per flow pathway.
    PerPathway,
    Pathway,
    5
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_parse_back() {
        for f in ChemicalFraction::ALL {
            assert_eq!(f.code().parse::<ChemicalFraction>().unwrap(), f);
        }
        for p in Pathway::ALL {
            assert_eq!(p.code().parse::<Pathway>().unwrap(), p);
        }
        assert_eq!("drp".parse::<ChemicalFraction>().unwrap(), ChemicalFraction::DissolvedReactive);
        assert!("XX".parse::<Pathway>().is_err());
    }

    #[test]
    fn ext_code_mapping_is_ordered_low_to_high() {
        assert_eq!(CoverageCategory::from_ext_code(1), Some(CoverageCategory::Low));
        assert_eq!(CoverageCategory::from_ext_code(2), Some(CoverageCategory::Medium));
        assert_eq!(CoverageCategory::from_ext_code(3), Some(CoverageCategory::High));
        assert_eq!(CoverageCategory::from_ext_code(0), None);
        assert!(CoverageCategory::Low < CoverageCategory::High);
        for c in CoverageCategory::ALL {
            assert_eq!(CoverageCategory::from_ext_code(c.ext_code()), Some(c));
        }
    }

    #[test]
    fn keyed_arrays_index_by_key() {
        let mut p = PerPathway::from_fn(|pw| pw.position() as Real);
        assert_eq!(p[Pathway::DeepGroundwater], 4.0);
        p[Pathway::SurfaceRunoff] = 10.0;
        assert_eq!(p.sum(), 10.0 + 1.0 + 2.0 + 3.0 + 4.0);

        let f = PerFraction([1.0, 2.0, 3.0]);
        let doubled = f.map(|_, v| v * 2.0);
        assert_eq!(doubled[ChemicalFraction::DissolvedOrganic], 6.0);
        assert_eq!(f.iter().count(), 3);
    }
}
