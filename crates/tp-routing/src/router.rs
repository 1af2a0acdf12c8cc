//! Single-pass accumulation over the validated processing order.

use rayon::prelude::*;
use tp_core::{DefaultApplied, Diagnostics, ReachAttributeStore, ReachIdx, Real};
use tp_network::ReachNetwork;

use crate::error::{RoutingError, RoutingResult};
use crate::policy::{AttenuationConvention, RoutingPolicy};

/// Generated loads of one scenario, indexed by `ReachIdx`.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioLoads {
    pub scenario: String,
    pub generated: Vec<Real>,
}

/// Generated and routed loads of one scenario, indexed by `ReachIdx`.
#[derive(Clone, Debug, PartialEq)]
pub struct RoutedScenario {
    pub scenario: String,
    pub generated: Vec<Real>,
    pub routed: Vec<Real>,
}

impl RoutedScenario {
    pub fn routed_at(&self, idx: ReachIdx) -> Real {
        self.routed.get(idx.as_usize()).copied().unwrap_or(0.0)
    }

    pub fn generated_at(&self, idx: ReachIdx) -> Real {
        self.generated.get(idx.as_usize()).copied().unwrap_or(0.0)
    }

    /// Summed routed load at the network outlets.
    pub fn outlet_total(&self, network: &ReachNetwork) -> Real {
        network
            .outlets()
            .into_iter()
            .map(|idx| self.routed_at(idx))
            .sum()
    }
}

/// Router bound to one network and one set of attenuation factors.
///
/// Every scenario routed by the same router shares the graph and the
/// factors, so scenario differences come from generated loads only.
#[derive(Debug, Clone)]
pub struct NetworkRouter<'a> {
    network: &'a ReachNetwork,
    attenuation: Vec<Real>,
    convention: AttenuationConvention,
}

impl<'a> NetworkRouter<'a> {
    /// Explicit per-reach factors, indexed by `ReachIdx`.
    pub fn with_factors(
        network: &'a ReachNetwork,
        attenuation: Vec<Real>,
        convention: AttenuationConvention,
    ) -> RoutingResult<Self> {
        if attenuation.len() != network.len() {
            return Err(RoutingError::LengthMismatch {
                scenario: "attenuation".to_string(),
                expected: network.len(),
                actual: attenuation.len(),
            });
        }
        for (reach, &value) in network.reaches().iter().zip(&attenuation) {
            if !(0.0..=1.0).contains(&value) {
                return Err(RoutingError::InvalidAttenuation {
                    reach: reach.id,
                    value,
                });
            }
        }
        Ok(Self {
            network,
            attenuation,
            convention,
        })
    }

    /// Factors taken from the attribute store. Reaches without a factor
    /// (or without attributes) get the policy default, and each is
    /// recorded as `MissingAttenuation`.
    pub fn from_store(
        network: &'a ReachNetwork,
        store: &ReachAttributeStore,
        policy: &RoutingPolicy,
    ) -> RoutingResult<(Self, Diagnostics)> {
        policy.validate()?;
        let mut diags = Diagnostics::new();
        let attenuation = network
            .reaches()
            .iter()
            .map(|reach| {
                match store.get(reach.id).and_then(|attrs| attrs.attenuation) {
                    Some(a) => a,
                    None => {
                        diags.default_applied(DefaultApplied::MissingAttenuation {
                            reach: reach.id,
                            applied: policy.default_attenuation,
                        });
                        policy.default_attenuation
                    }
                }
            })
            .collect();
        let router = Self::with_factors(network, attenuation, policy.convention)?;
        Ok((router, diags))
    }

    pub fn network(&self) -> &ReachNetwork {
        self.network
    }

    pub fn convention(&self) -> AttenuationConvention {
        self.convention
    }

    pub fn attenuation(&self, idx: ReachIdx) -> Real {
        self.attenuation[idx.as_usize()]
    }

    /// Route one scenario.
    pub fn route(&self, loads: &ScenarioLoads) -> RoutingResult<RoutedScenario> {
        let n = self.network.len();
        if loads.generated.len() != n {
            return Err(RoutingError::LengthMismatch {
                scenario: loads.scenario.clone(),
                expected: n,
                actual: loads.generated.len(),
            });
        }
        for (reach, &value) in self.network.reaches().iter().zip(&loads.generated) {
            if !value.is_finite() {
                return Err(RoutingError::NonFiniteLoad {
                    scenario: loads.scenario.clone(),
                    reach: reach.id,
                    value,
                });
            }
        }

        let mut routed = vec![0.0; n];
        for idx in self.network.order().iter() {
            let i = idx.as_usize();
            let inflow: Real = self
                .network
                .upstream(idx)
                .iter()
                .map(|&u| {
                    let factor = match self.convention {
                        AttenuationConvention::Receiving => self.attenuation[i],
                        AttenuationConvention::Upstream => self.attenuation[u.as_usize()],
                    };
                    routed[u.as_usize()] * factor
                })
                .sum();
            routed[i] = loads.generated[i] + inflow;
        }

        Ok(RoutedScenario {
            scenario: loads.scenario.clone(),
            generated: loads.generated.clone(),
            routed,
        })
    }

    /// Route independent scenarios in parallel; output order matches input.
    pub fn route_all(&self, scenarios: &[ScenarioLoads]) -> RoutingResult<Vec<RoutedScenario>> {
        scenarios.par_iter().map(|s| self.route(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tp_core::{ReachAttributes, ReachId};
    use tp_network::NetworkBuilder;

    fn chain() -> ReachNetwork {
        let mut b = NetworkBuilder::new();
        b.add_reach(1, 1, 0, 1);
        b.add_reach(2, 2, 1, 2);
        b.build().unwrap()
    }

    #[test]
    fn two_reach_chain() {
        let net = chain();
        let router = NetworkRouter::with_factors(&net, vec![0.5, 0.9], AttenuationConvention::Receiving).unwrap();
        let out = router
            .route(&ScenarioLoads {
                scenario: "baseline".into(),
                generated: vec![10.0, 5.0],
            })
            .unwrap();
        assert_eq!(out.routed, vec![10.0, 14.0]);
        assert_eq!(out.outlet_total(&net), 14.0);
    }

    #[test]
    fn upstream_convention_uses_source_factor() {
        let net = chain();
        let router = NetworkRouter::with_factors(&net, vec![0.5, 0.9], AttenuationConvention::Upstream).unwrap();
        let out = router
            .route(&ScenarioLoads {
                scenario: "baseline".into(),
                generated: vec![10.0, 5.0],
            })
            .unwrap();
        assert_eq!(out.routed, vec![10.0, 10.0]);
    }

    #[test]
    fn missing_attenuation_defaults_and_is_recorded() {
        let net = chain();
        let store = ReachAttributeStore::from_records(
            vec![ReachAttributes::new(1, 1.0), ReachAttributes::new(2, 1.0).with_attenuation(0.5)],
            0.01,
        )
        .unwrap();
        let (router, diags) = NetworkRouter::from_store(&net, &store, &RoutingPolicy::default()).unwrap();
        assert_eq!(router.attenuation(net.idx_of(ReachId(1)).unwrap()), 0.9);
        assert_eq!(router.attenuation(net.idx_of(ReachId(2)).unwrap()), 0.5);
        assert_eq!(
            diags.defaults(),
            &[DefaultApplied::MissingAttenuation {
                reach: ReachId(1),
                applied: 0.9
            }]
        );
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let net = chain();
        let router = NetworkRouter::with_factors(&net, vec![1.0, 1.0], AttenuationConvention::Receiving).unwrap();
        let err = router
            .route(&ScenarioLoads {
                scenario: "x".into(),
                generated: vec![1.0],
            })
            .unwrap_err();
        assert!(matches!(err, RoutingError::LengthMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn out_of_range_factor_is_rejected() {
        let net = chain();
        let err = NetworkRouter::with_factors(&net, vec![1.2, 1.0], AttenuationConvention::Receiving).unwrap_err();
        assert_eq!(
            err,
            RoutingError::InvalidAttenuation {
                reach: ReachId(1),
                value: 1.2
            }
        );
    }
}
