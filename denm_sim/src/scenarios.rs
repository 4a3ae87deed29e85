//! Dissemination study scenarios.
//!
//! Two incident kinds crossed with three infrastructure deployments:
//!
//! ```text
//!               terrestrial    satellite    hybrid
//!   crashed     crashed_t...   crashed_s... crashed_h...
//!   witness     witness_t...   witness_s... witness_h...
//! ```

use denm_core::{RelayConfig, TriggerCause};
use std::time::Duration;

/// How the alert enters the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncidentKind {
    /// The crashed vehicle itself raises `crash_incident`
    Crashed,
    
    /// The accident vehicle is silent; a following vehicle raises
    /// `witness_report` after its reaction delay
    Witness,
}

impl IncidentKind {
    pub fn trigger(&self) -> TriggerCause {
        match self {
            IncidentKind::Crashed => TriggerCause::CrashIncident,
            IncidentKind::Witness => TriggerCause::WitnessReport,
        }
    }
}

/// Which relay infrastructure is deployed along the road.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Deployment {
    Terrestrial,
    Satellite,
    /// Roadside antennas plus one satellite
    Hybrid,
}

impl Deployment {
    pub fn name(&self) -> &'static str {
        match self {
            Deployment::Terrestrial => "terrestrial",
            Deployment::Satellite => "satellite",
            Deployment::Hybrid => "hybrid",
        }
    }
    
    /// Relay profiles to instantiate for `num_relays` requested relays.
    pub fn profiles(&self, num_relays: usize) -> Vec<InfrastructureProfile> {
        match self {
            Deployment::Terrestrial => vec![InfrastructureProfile::terrestrial(); num_relays],
            Deployment::Satellite => vec![InfrastructureProfile::satellite(); num_relays],
            Deployment::Hybrid => {
                let mut profiles = vec![InfrastructureProfile::terrestrial(); num_relays];
                if num_relays > 0 {
                    profiles.push(InfrastructureProfile::satellite());
                }
                profiles
            }
        }
    }
}

/// One relay node type: protocol config plus the radio it broadcasts with.
#[derive(Debug, Clone, PartialEq)]
pub struct InfrastructureProfile {
    /// Relay-side configuration
    pub relay: RelayConfig,
    
    /// Module name prefix in recorded scalars
    pub module_prefix: &'static str,
    
    /// Downlink latency applied to every re-broadcast
    pub downlink_latency: Duration,
    
    /// Downlink broadcast range (meters)
    pub broadcast_range_m: f64,
    
    /// Height above the road axis used for placement (meters)
    pub standoff_m: f64,
}

impl InfrastructureProfile {
    /// 6G roadside antenna: ~5 ms, 600 m.
    pub fn terrestrial() -> Self {
        Self {
            relay: RelayConfig {
                infrastructure_type: "terrestrial".to_string(),
                latency_secs: 0.005,
                coverage_radius_m: 600.0,
                coverage_reliability: 0.95,
                transmit_power_mw: 200.0,
            },
            module_prefix: "antenna",
            downlink_latency: Duration::from_millis(5),
            broadcast_range_m: 600.0,
            standoff_m: 20.0,
        }
    }
    
    /// LEO satellite: ~45 ms, 5000 m footprint.
    pub fn satellite() -> Self {
        Self {
            relay: RelayConfig {
                infrastructure_type: "satellite".to_string(),
                latency_secs: 0.045,
                coverage_radius_m: 5000.0,
                coverage_reliability: 0.9,
                transmit_power_mw: 1000.0,
            },
            module_prefix: "satellite",
            downlink_latency: Duration::from_millis(45),
            broadcast_range_m: 5000.0,
            standoff_m: 0.0,
        }
    }
    
    /// Looks a profile up by its infrastructure type label.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "terrestrial" | "antenna" => Some(Self::terrestrial()),
            "satellite" => Some(Self::satellite()),
            _ => None,
        }
    }
    
    /// Overrides the reliability factor.
    pub fn with_reliability(mut self, reliability: f64) -> Self {
        self.relay.coverage_reliability = reliability;
        self
    }
}

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    CrashedTerrestrial,
    CrashedSatellite,
    CrashedHybrid,
    WitnessTerrestrial,
    WitnessSatellite,
    WitnessHybrid,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::CrashedTerrestrial,
            ScenarioId::CrashedSatellite,
            ScenarioId::CrashedHybrid,
            ScenarioId::WitnessTerrestrial,
            ScenarioId::WitnessSatellite,
            ScenarioId::WitnessHybrid,
        ]
    }
    
    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::CrashedTerrestrial => "crashed_terrestrial",
            ScenarioId::CrashedSatellite => "crashed_satellite",
            ScenarioId::CrashedHybrid => "crashed_hybrid",
            ScenarioId::WitnessTerrestrial => "witness_terrestrial",
            ScenarioId::WitnessSatellite => "witness_satellite",
            ScenarioId::WitnessHybrid => "witness_hybrid",
        }
    }
    
    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::CrashedTerrestrial => "Crashed vehicle alerts itself, roadside antennas relay",
            ScenarioId::CrashedSatellite => "Crashed vehicle alerts itself, LEO satellite relays",
            ScenarioId::CrashedHybrid => "Crashed vehicle alerts itself, antennas and satellite relay",
            ScenarioId::WitnessTerrestrial => "Silent crash reported by a witness, roadside antennas relay",
            ScenarioId::WitnessSatellite => "Silent crash reported by a witness, LEO satellite relays",
            ScenarioId::WitnessHybrid => "Silent crash reported by a witness, antennas and satellite relay",
        }
    }
    
    pub fn incident(&self) -> IncidentKind {
        match self {
            ScenarioId::CrashedTerrestrial | ScenarioId::CrashedSatellite | ScenarioId::CrashedHybrid => {
                IncidentKind::Crashed
            }
            _ => IncidentKind::Witness,
        }
    }
    
    pub fn deployment(&self) -> Deployment {
        match self {
            ScenarioId::CrashedTerrestrial | ScenarioId::WitnessTerrestrial => Deployment::Terrestrial,
            ScenarioId::CrashedSatellite | ScenarioId::WitnessSatellite => Deployment::Satellite,
            ScenarioId::CrashedHybrid | ScenarioId::WitnessHybrid => Deployment::Hybrid,
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;
    
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "crashed_terrestrial" | "crashedterrestrial" => Ok(ScenarioId::CrashedTerrestrial),
            "crashed_satellite" | "crashedsatellite" => Ok(ScenarioId::CrashedSatellite),
            "crashed_hybrid" | "crashedhybrid" => Ok(ScenarioId::CrashedHybrid),
            "witness_terrestrial" | "witnessterrestrial" => Ok(ScenarioId::WitnessTerrestrial),
            "witness_satellite" | "witnesssatellite" => Ok(ScenarioId::WitnessSatellite),
            "witness_hybrid" | "witnesshybrid" => Ok(ScenarioId::WitnessHybrid),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
