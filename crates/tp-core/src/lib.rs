//! tp-core: stable foundation for the phosphorus load pipeline.
//!
//! Contains:
//! - ids (compact reach indices + external reach identifiers)
//! - numeric (Real + tolerances + float helpers)
//! - phosphorus (chemical fractions, pathways, coverage categories)
//! - reach (immutable per-reach input attributes)
//! - diagnostics (defaults applied and validation flags)
//! - error (shared error types)

pub mod diagnostics;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod phosphorus;
pub mod reach;

// Re-exports: nice ergonomics for downstream crates
pub use diagnostics::{
    DefaultApplied, Diagnostic, DiagnosticCounts, Diagnostics, LoadStage, ValidationFlag,
};
pub use error::{TpError, TpResult};
pub use ids::*;
pub use numeric::*;
pub use phosphorus::*;
pub use reach::{PathwaySplit, ReachAttributeStore, ReachAttributes};
