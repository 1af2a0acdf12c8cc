//! tp-mitigation: constructed-wetland treatment of per-reach TP loads.
//!
//! Stages, per reach:
//! 1. agricultural filter (gross -> available load)
//! 2. [`LoadFractionSplitter`]: fractions, bank erosion / mitigable, pathways
//! 3. [`MitigationApplier`]: remaining fraction per pathway and fraction
//!
//! All stages are pure. Missing optional inputs resolve to documented
//! defaults recorded in [`tp_core::Diagnostics`].

pub mod applier;
pub mod engine;
pub mod error;
pub mod fractions;
pub mod policy;
pub mod removal;
pub mod splitter;

pub use applier::{MitigatedLoad, MitigationApplier, PathwayOutcome, PathwayTotals, RemovalRule};
pub use engine::{MitigationEngine, MitigationRequest, ReachMitigation};
pub use error::{MitigationError, MitigationResult};
pub use fractions::FractionSplits;
pub use policy::{BypassRule, CoverageThresholds, MitigationPolicy};
pub use removal::{RemovalFactorRow, RemovalFactorTable};
pub use splitter::{AvailableLoad, FractionLoad, LoadFractionSplitter, SplitLoad};
