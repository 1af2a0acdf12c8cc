//! Error types for the tp-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates and
/// gives frontends one error to report.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Study error: {0}")]
    Project(String),

    #[error("Failed to write study file: {path}")]
    StudyFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Study validation failed: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Study compilation failed: {0}")]
    Compile(String),

    #[error("Routing error: {0}")]
    Routing(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tp-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<tp_project::ProjectError> for AppError {
    fn from(err: tp_project::ProjectError) -> Self {
        match err {
            tp_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<tp_network::NetworkError> for AppError {
    fn from(err: tp_network::NetworkError) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<tp_mitigation::MitigationError> for AppError {
    fn from(err: tp_mitigation::MitigationError) -> Self {
        AppError::Compile(err.to_string())
    }
}

impl From<tp_routing::RoutingError> for AppError {
    fn from(err: tp_routing::RoutingError) -> Self {
        AppError::Routing(err.to_string())
    }
}

impl From<tp_results::ResultsError> for AppError {
    fn from(err: tp_results::ResultsError) -> Self {
        match err {
            tp_results::ResultsError::RunNotFound { run_id } => AppError::RunNotFound(run_id),
            other => AppError::Results(other.to_string()),
        }
    }
}

impl From<tp_core::TpError> for AppError {
    fn from(err: tp_core::TpError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}
