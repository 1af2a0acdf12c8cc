use thiserror::Error;
use tp_core::ReachId;
use tp_network::NetworkError;

pub type RoutingResult<T> = Result<T, RoutingError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoutingError {
    #[error("Scenario '{scenario}' has {actual} generated loads for {expected} reaches")]
    LengthMismatch {
        scenario: String,
        expected: usize,
        actual: usize,
    },

    #[error("Non-finite generated load {value} for reach {reach} in scenario '{scenario}'")]
    NonFiniteLoad {
        scenario: String,
        reach: ReachId,
        value: f64,
    },

    #[error("Attenuation factor {value} for reach {reach} is outside [0, 1]")]
    InvalidAttenuation { reach: ReachId, value: f64 },

    #[error("Invalid routing policy: {what}")]
    InvalidPolicy { what: String },

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}
