use serde::{Deserialize, Serialize};
use tp_core::Real;

use crate::error::{RoutingError, RoutingResult};

/// Whose attenuation factor applies to an upstream contribution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttenuationConvention {
    /// `routed(u) * atten(r)`: loss while travelling through the receiving reach.
    #[default]
    Receiving,
    /// `routed(u) * atten(u)`: loss applied as load leaves the upstream reach.
    Upstream,
}

impl AttenuationConvention {
    pub fn as_str(self) -> &'static str {
        match self {
            AttenuationConvention::Receiving => "receiving",
            AttenuationConvention::Upstream => "upstream",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutingPolicy {
    /// Used for reaches without an attenuation factor.
    pub default_attenuation: Real,
    pub convention: AttenuationConvention,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            default_attenuation: 0.90,
            convention: AttenuationConvention::Receiving,
        }
    }
}

impl RoutingPolicy {
    pub fn validate(&self) -> RoutingResult<()> {
        if !(0.0..=1.0).contains(&self.default_attenuation) {
            return Err(RoutingError::InvalidPolicy {
                what: format!(
                    "default_attenuation = {} must lie in [0, 1]",
                    self.default_attenuation
                ),
            });
        }
        Ok(())
    }
}
