//! Removal factor lookup keyed by (coverage category, pathway, fraction).

use std::collections::HashMap;

use tp_core::{ChemicalFraction, CoverageCategory, Pathway, PerFraction, Real, percent_to_fraction};

use crate::error::{MitigationError, MitigationResult};

/// One table row: percent of load REMAINING per chemical fraction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RemovalFactorRow {
    pub category: CoverageCategory,
    pub pathway: Pathway,
    pub remaining_percent: PerFraction<Real>,
}

type FactorKey = (CoverageCategory, Pathway, ChemicalFraction);

/// Remaining fraction after wetland treatment. Loaded once, read-only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemovalFactorTable {
    remaining: HashMap<FactorKey, Real>,
}

impl RemovalFactorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows<I>(rows: I) -> MitigationResult<Self>
    where
        I: IntoIterator<Item = RemovalFactorRow>,
    {
        let mut table = Self::new();
        for row in rows {
            for (fraction, percent) in row.remaining_percent.iter() {
                table.insert_percent(row.category, row.pathway, fraction, *percent)?;
            }
        }
        Ok(table)
    }

    /// Insert a percent-remaining entry, rejecting duplicates and values outside 0..=100.
    pub fn insert_percent(
        &mut self,
        category: CoverageCategory,
        pathway: Pathway,
        fraction: ChemicalFraction,
        percent_remaining: Real,
    ) -> MitigationResult<()> {
        if !(0.0..=100.0).contains(&percent_remaining) {
            return Err(MitigationError::FactorOutOfRange {
                category,
                pathway,
                fraction,
                value: percent_remaining,
            });
        }
        let key = (category, pathway, fraction);
        if self.remaining.contains_key(&key) {
            return Err(MitigationError::DuplicateFactor {
                category,
                pathway,
                fraction,
            });
        }
        self.remaining
            .insert(key, percent_to_fraction(percent_remaining));
        Ok(())
    }

    /// Remaining fraction (0..=1) or `None` when the table has no entry.
    pub fn remaining(
        &self,
        category: CoverageCategory,
        pathway: Pathway,
        fraction: ChemicalFraction,
    ) -> Option<Real> {
        self.remaining.get(&(category, pathway, fraction)).copied()
    }

    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    /// All rows in (category, pathway) order. Missing cells read as 100% remaining.
    pub fn rows(&self) -> Vec<RemovalFactorRow> {
        let mut rows = Vec::new();
        for category in CoverageCategory::ALL {
            for pathway in Pathway::ALL {
                if ChemicalFraction::ALL
                    .iter()
                    .all(|&f| self.remaining(category, pathway, f).is_none())
                {
                    continue;
                }
                rows.push(RemovalFactorRow {
                    category,
                    pathway,
                    remaining_percent: PerFraction::from_fn(|f| {
                        self.remaining(category, pathway, f).unwrap_or(1.0) * 100.0
                    }),
                });
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: CoverageCategory, pathway: Pathway, pct: [Real; 3]) -> RemovalFactorRow {
        RemovalFactorRow {
            category,
            pathway,
            remaining_percent: PerFraction(pct),
        }
    }

    #[test]
    fn lookup_returns_fraction() {
        let table = RemovalFactorTable::from_rows([row(
            CoverageCategory::Low,
            Pathway::SurfaceRunoff,
            [74.0, 80.0, 90.0],
        )])
        .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.remaining(CoverageCategory::Low, Pathway::SurfaceRunoff, ChemicalFraction::Particulate),
            Some(0.74)
        );
        assert_eq!(
            table.remaining(CoverageCategory::High, Pathway::SurfaceRunoff, ChemicalFraction::Particulate),
            None
        );
    }

    #[test]
    fn duplicate_key_rejected() {
        let err = RemovalFactorTable::from_rows([
            row(CoverageCategory::Medium, Pathway::Interflow, [50.0; 3]),
            row(CoverageCategory::Medium, Pathway::Interflow, [60.0; 3]),
        ])
        .unwrap_err();
        assert!(matches!(err, MitigationError::DuplicateFactor { .. }));
    }

    #[test]
    fn out_of_range_rejected() {
        let err = RemovalFactorTable::from_rows([row(
            CoverageCategory::High,
            Pathway::TileDrainage,
            [120.0, 50.0, 50.0],
        )])
        .unwrap_err();
        assert!(matches!(err, MitigationError::FactorOutOfRange { value, .. } if value == 120.0));
    }

    #[test]
    fn rows_preserve_entries() {
        let input = row(CoverageCategory::High, Pathway::ShallowGroundwater, [40.0, 60.0, 70.0]);
        let table = RemovalFactorTable::from_rows([input]).unwrap();
        let rows = table.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, CoverageCategory::High);
        assert!((rows[0].remaining_percent[ChemicalFraction::DissolvedReactive] - 60.0).abs() < 1e-9);
    }
}
