//! Configuration contract violations.
//!
//! These are the only hard errors in the protocol core. Everything that can
//! happen to a message at runtime is a modeled outcome, not an error.

use thiserror::Error;

/// Errors raised when a component is constructed with a bad configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("coverage reliability must be within [0, 1], got {0}")]
    ReliabilityOutOfRange(f64),
    
    #[error("infrastructure latency must be a non-negative number of seconds, got {0}")]
    InvalidLatency(f64),
    
    #[error("coverage radius must be a non-negative number of meters, got {0}")]
    InvalidCoverageRadius(f64),
    
    #[error("transmit power must be a non-negative number of mW, got {0}")]
    InvalidTransmitPower(f64),
    
    #[error("DENM deadline must be a non-negative number of seconds, got {0}")]
    InvalidDeadline(f64),
    
    #[error("infrastructure type must not be empty")]
    EmptyInfrastructureType,
}
