//! Harness error type.

use denm_core::ConfigError;
use thiserror::Error;

/// Errors surfaced by the simulation harness.
#[derive(Debug, Error)]
pub enum SimError {
    /// A component rejected its configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),
    
    /// A harness parameter is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
