//! Errors for scenario generation, dataset I/O and experiments

use thiserror::Error;
use trackfuse_core::FusionError;

/// Result type for the simulation crate
pub type SimResult<T> = Result<T, SimError>;

/// Simulation errors
#[derive(Debug, Error)]
pub enum SimError {
    /// Reading or writing a dataset or configuration file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A dataset or configuration file is not valid JSON for its type
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The core rejected a parameter or a step
    #[error("Fusion error: {0}")]
    Fusion(#[from] FusionError),

    /// Scenario parameters outside their domain
    #[error("Invalid scenario: {0}")]
    Scenario(String),
}

impl SimError {
    /// True when the error came from the estimator's numerical checks
    pub fn is_numerical(&self) -> bool {
        matches!(self, Self::Fusion(e) if e.is_numerical())
    }
}
