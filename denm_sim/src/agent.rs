//! SimulatedStation - a protocol agent placed in the simulated world.
//!
//! Binds a `denm_core::Agent` to its `SimNetwork` and to the module path
//! its scalars are recorded under.

use crate::network::SimNetwork;
use crate::scenarios::InfrastructureProfile;
use denm_core::{Agent, ConfigError, ReceiverConfig, TriggerCause};
use denm_env::{Position, StationId};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// What kind of body a station is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StationKind {
    /// Mobile, listens and may originate
    Vehicle,
    
    /// Static relay
    Infrastructure,
}

/// A station running in the deterministic environment.
pub struct SimulatedStation {
    /// The underlying protocol agent
    inner: Agent<SimNetwork>,
    
    kind: StationKind,
    
    /// Recording path, e.g. `node[4]` or `antenna[0]`
    module: String,
}

impl SimulatedStation {
    /// Creates a vehicle with a receiver, and an originator if `trigger` is set.
    pub fn vehicle(
        network: Arc<SimNetwork>,
        index: usize,
        position: Position,
        receiver: ReceiverConfig,
        trigger: Option<TriggerCause>,
    ) -> Result<Self, ConfigError> {
        let mut inner = Agent::new(network, position).with_receiver(receiver)?;
        if let Some(trigger) = trigger {
            inner = inner.with_originator(trigger);
        }
        
        Ok(Self {
            inner,
            kind: StationKind::Vehicle,
            module: format!("node[{}]", index),
        })
    }
    
    /// Creates a relay from an infrastructure profile.
    pub fn infrastructure(
        network: Arc<SimNetwork>,
        index: usize,
        position: Position,
        profile: &InfrastructureProfile,
        rng: ChaCha8Rng,
    ) -> Result<Self, ConfigError> {
        let inner = Agent::new(network, position).with_relay(profile.relay.clone(), rng)?;
        
        Ok(Self {
            inner,
            kind: StationKind::Infrastructure,
            module: format!("{}[{}]", profile.module_prefix, index),
        })
    }
    
    pub fn station_id(&self) -> StationId {
        self.inner.station_id()
    }
    
    pub fn kind(&self) -> StationKind {
        self.kind
    }
    
    pub fn module(&self) -> &str {
        &self.module
    }
    
    pub fn agent(&self) -> &Agent<SimNetwork> {
        &self.inner
    }
    
    pub fn agent_mut(&mut self) -> &mut Agent<SimNetwork> {
        &mut self.inner
    }
}
