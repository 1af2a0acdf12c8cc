//! Network-specific error types.

use tp_core::{HydSeq, ReachId};

pub type NetworkResult<T> = Result<T, NetworkError>;

/// Network construction and validation errors.
///
/// Ordering problems (`Cycle`, `SequenceViolation`) are kept distinct from
/// lookup failures (`ReachNotFound`): the former corrupt every routed value
/// downstream, the latter point at a mismatched input table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The same reach appears twice in the edge list.
    DuplicateReach { reach: ReachId },

    /// The edge list contains a directed cycle through this reach.
    Cycle { reach: ReachId },

    /// An upstream reach does not have a strictly smaller sequence number.
    SequenceViolation {
        upstream: ReachId,
        upstream_hydseq: HydSeq,
        downstream: ReachId,
        downstream_hydseq: HydSeq,
    },

    /// Reach id not present in the network.
    ReachNotFound { reach: ReachId },

    /// Adjacency list is inconsistent with the derived links.
    InconsistentAdjacency { reach: ReachId },
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::DuplicateReach { reach } => {
                write!(f, "Reach {} appears more than once in the edge list", reach)
            }
            NetworkError::Cycle { reach } => {
                write!(f, "Reach network contains a cycle through reach {}", reach)
            }
            NetworkError::SequenceViolation {
                upstream,
                upstream_hydseq,
                downstream,
                downstream_hydseq,
            } => {
                write!(
                    f,
                    "Reach {} (hydseq {}) flows into reach {} (hydseq {}) but its sequence is not smaller",
                    upstream, upstream_hydseq, downstream, downstream_hydseq
                )
            }
            NetworkError::ReachNotFound { reach } => {
                write!(f, "Reach {} not found in network", reach)
            }
            NetworkError::InconsistentAdjacency { reach } => {
                write!(f, "Adjacency list of reach {} is inconsistent", reach)
            }
        }
    }
}

impl std::error::Error for NetworkError {}

impl NetworkError {
    /// True for errors that mean the processing order cannot be trusted.
    pub fn is_ordering_error(&self) -> bool {
        matches!(
            self,
            NetworkError::Cycle { .. } | NetworkError::SequenceViolation { .. }
        )
    }
}
