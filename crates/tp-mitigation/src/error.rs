use thiserror::Error;
use tp_core::{ChemicalFraction, CoverageCategory, Pathway, TpError};

pub type MitigationResult<T> = Result<T, MitigationError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MitigationError {
    #[error("Chemical fraction splits sum to {actual}% (expected 100%)")]
    FractionSum { actual: f64 },

    #[error("Invalid policy: {what}")]
    InvalidPolicy { what: String },

    #[error("Duplicate removal factor for ({category}, {pathway}, {fraction})")]
    DuplicateFactor {
        category: CoverageCategory,
        pathway: Pathway,
        fraction: ChemicalFraction,
    },

    #[error("Removal factor for ({category}, {pathway}, {fraction}) is {value}% remaining, outside 0..=100")]
    FactorOutOfRange {
        category: CoverageCategory,
        pathway: Pathway,
        fraction: ChemicalFraction,
        value: f64,
    },

    #[error("Reach input error: {0}")]
    Reach(#[from] TpError),
}
