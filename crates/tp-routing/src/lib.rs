//! tp-routing: downstream accumulation of generated loads.
//!
//! ```text
//! routed(r) = generated(r) + sum over direct upstream u of routed(u) * atten
//! ```
//!
//! `atten` is the receiving reach's factor by default, see
//! [`AttenuationConvention`].

pub mod error;
pub mod policy;
pub mod router;

pub use error::{RoutingError, RoutingResult};
pub use policy::{AttenuationConvention, RoutingPolicy};
pub use router::{NetworkRouter, RoutedScenario, ScenarioLoads};
