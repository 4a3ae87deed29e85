//! Configuration surface consumed by the protocol components.
//!
//! Values arrive from outside (CLI, scenario presets, a config file) as
//! plain numbers; `validate()` is the construction-time gate.

use crate::error::ConfigError;
use denm_env::secs_to_duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for an infrastructure relay node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Free-form label ("terrestrial", "satellite", "hybrid"), stamped on
    /// relayed messages for attribution
    pub infrastructure_type: String,
    
    /// Processing latency in seconds, added to the cloud delivery record only
    pub latency_secs: f64,
    
    /// Coverage radius in meters (telemetry only)
    pub coverage_radius_m: f64,
    
    /// Probability in [0, 1] that an accepted message is re-broadcast
    pub coverage_reliability: f64,
    
    /// Transmit power in mW (telemetry only)
    pub transmit_power_mw: f64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            infrastructure_type: "terrestrial".to_string(),
            latency_secs: 0.01,
            coverage_radius_m: 1000.0,
            coverage_reliability: 1.0,
            transmit_power_mw: 200.0,
        }
    }
}

impl RelayConfig {
    /// Checks every field against its contract.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.infrastructure_type.trim().is_empty() {
            return Err(ConfigError::EmptyInfrastructureType);
        }
        if !(0.0..=1.0).contains(&self.coverage_reliability) {
            return Err(ConfigError::ReliabilityOutOfRange(self.coverage_reliability));
        }
        if !self.latency_secs.is_finite() || self.latency_secs < 0.0 {
            return Err(ConfigError::InvalidLatency(self.latency_secs));
        }
        if !self.coverage_radius_m.is_finite() || self.coverage_radius_m < 0.0 {
            return Err(ConfigError::InvalidCoverageRadius(self.coverage_radius_m));
        }
        if !self.transmit_power_mw.is_finite() || self.transmit_power_mw < 0.0 {
            return Err(ConfigError::InvalidTransmitPower(self.transmit_power_mw));
        }
        Ok(())
    }
    
    /// Processing latency as a `Duration`.
    pub fn latency(&self) -> Duration {
        secs_to_duration(self.latency_secs)
    }
}

/// Configuration for a receiving vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Maximum useful delay between event and reception, in seconds
    pub denm_deadline_secs: f64,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            denm_deadline_secs: 0.5,
        }
    }
}

impl ReceiverConfig {
    /// Creates a receiver config with the given deadline.
    pub fn with_deadline(denm_deadline_secs: f64) -> Self {
        Self { denm_deadline_secs }
    }
    
    /// Checks the deadline contract.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.denm_deadline_secs.is_finite() || self.denm_deadline_secs < 0.0 {
            return Err(ConfigError::InvalidDeadline(self.denm_deadline_secs));
        }
        Ok(())
    }
    
    /// Deadline as a `Duration`.
    pub fn deadline(&self) -> Duration {
        secs_to_duration(self.denm_deadline_secs)
    }
}
