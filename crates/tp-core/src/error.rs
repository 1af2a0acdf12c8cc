use thiserror::Error;

use crate::ids::ReachId;

pub type TpResult<T> = Result<T, TpError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TpError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Duplicate reach id {reach} in {context}")]
    DuplicateReach { reach: ReachId, context: &'static str },

    #[error("Percentages for {what} sum to {actual} (expected {expected})")]
    SumMismatch {
        what: String,
        expected: f64,
        actual: f64,
    },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
