//! tp-network: river reach network for load routing.
//!
//! Provides:
//! - Core network data structures (Reach, ReachNetwork, ProcessingOrder)
//! - Builder that derives upstream adjacency from a raw edge list
//! - Validation of the hydrological sequence against the edge list
//! - Stable indexing between reach ids and contiguous indices
//!
//! # Example
//!
//! ```
//! use tp_network::NetworkBuilder;
//!
//! // Headwater reach 1 (node 10 -> 11) flows into reach 2 (node 11 -> 12).
//! let mut builder = NetworkBuilder::new();
//! builder.add_reach(1, 100, 10, 11);
//! builder.add_reach(2, 200, 11, 12);
//! let network = builder.build().unwrap();
//!
//! let downstream = network.idx_of(2.into()).unwrap();
//! assert_eq!(network.upstream(downstream).len(), 1);
//! assert_eq!(network.order().len(), 2);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod indexing;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::{NetworkBuilder, ReachEdge};
pub use error::{NetworkError, NetworkResult};
pub use graph::{ProcessingOrder, Reach, ReachNetwork};
pub use indexing::IndexMap;
