//! Agent - one station combining any of the three protocol roles.
//!
//! Roles are composed, not inherited: an agent holds an optional
//! originator, relay and receiver, and dispatches each event to whichever
//! it has.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                 Agent<Net>                    │
//! │   station_id · position · Arc<Net>            │
//! │                                               │
//! │  ┌────────────┐ ┌──────────┐ ┌────────────┐   │
//! │  │ Originator │ │  Relay   │ │  Receiver  │   │
//! │  │  (option)  │ │ (option) │ │  (option)  │   │
//! │  └────────────┘ └──────────┘ └────────────┘   │
//! └───────────────────────────────────────────────┘
//!   on_trigger ──► originator
//!   on_receive ──► relay, then receiver
//! ```

use crate::config::{ReceiverConfig, RelayConfig};
use crate::error::ConfigError;
use crate::message::DisseminationMessage;
use crate::originator::{Originator, TriggerCause};
use crate::receiver::{ReceptionOutcome, Receiver};
use crate::relay::{Relay, RelayOutcome};
use denm_env::{BroadcastTransport, Position, SimTime, StationId, TelemetrySink};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// Which roles an agent carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities {
    pub can_originate: bool,
    pub can_relay: bool,
    pub can_receive: bool,
}

impl Capabilities {
    /// Plain vehicle: listens only.
    pub const VEHICLE: Capabilities = Capabilities {
        can_originate: false,
        can_relay: false,
        can_receive: true,
    };
    
    /// Vehicle that may raise an alert.
    pub const ORIGINATING_VEHICLE: Capabilities = Capabilities {
        can_originate: true,
        can_relay: false,
        can_receive: true,
    };
    
    /// Antenna or satellite node.
    pub const INFRASTRUCTURE: Capabilities = Capabilities {
        can_originate: false,
        can_relay: true,
        can_receive: false,
    };
}

/// What each role did with one received message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentReception {
    pub relay: Option<RelayOutcome>,
    pub receiver: Option<ReceptionOutcome>,
}

/// A station in the dissemination protocol.
///
/// Generic over the transport so the same agent runs against the
/// simulated network or a test double.
pub struct Agent<Net>
where
    Net: BroadcastTransport<DisseminationMessage>,
{
    /// Station identifier (taken from the transport)
    station_id: StationId,
    
    /// Network interface
    network: Arc<Net>,
    
    /// Current position, kept up to date by the mobility provider
    position: Position,
    
    originator: Option<Originator>,
    relay: Option<Relay>,
    receiver: Option<Receiver>,
}

impl<Net> Agent<Net>
where
    Net: BroadcastTransport<DisseminationMessage>,
{
    /// Creates an agent with no roles.
    pub fn new(network: Arc<Net>, position: Position) -> Self {
        Self {
            station_id: network.local_id(),
            network,
            position,
            originator: None,
            relay: None,
            receiver: None,
        }
    }
    
    /// Adds the originator role, answering to `trigger`.
    pub fn with_originator(mut self, trigger: TriggerCause) -> Self {
        self.originator = Some(Originator::new(self.station_id, trigger));
        self
    }
    
    /// Adds the relay role.
    pub fn with_relay(mut self, config: RelayConfig, rng: ChaCha8Rng) -> Result<Self, ConfigError> {
        self.relay = Some(Relay::new(self.station_id, config, rng)?);
        Ok(self)
    }
    
    /// Adds the receiver role.
    pub fn with_receiver(mut self, config: ReceiverConfig) -> Result<Self, ConfigError> {
        self.receiver = Some(Receiver::new(self.station_id, config)?);
        Ok(self)
    }
    
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            can_originate: self.originator.is_some(),
            can_relay: self.relay.is_some(),
            can_receive: self.receiver.is_some(),
        }
    }
    
    pub fn station_id(&self) -> StationId {
        self.station_id
    }
    
    pub fn position(&self) -> Position {
        self.position
    }
    
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }
    
    /// Storyboard trigger. Returns `true` if a DENM was emitted.
    pub fn on_trigger(&mut self, cause: &str, now: SimTime) -> bool {
        match self.originator.as_mut() {
            Some(originator) => originator.on_trigger(cause, now, self.position, self.network.as_ref()),
            None => false,
        }
    }
    
    /// Message delivered by the transport.
    pub fn on_receive(&mut self, msg: &DisseminationMessage, now: SimTime) -> AgentReception {
        let relay = self
            .relay
            .as_mut()
            .map(|relay| relay.on_receive(msg, now, self.position, self.network.as_ref()));
        let receiver = self.receiver.as_mut().map(|receiver| receiver.on_receive(msg, now));
        
        AgentReception { relay, receiver }
    }
    
    /// End-of-run bookkeeping for every role.
    pub fn finish(&mut self) {
        if let Some(originator) = self.originator.as_mut() {
            originator.finish();
        }
        if let Some(relay) = self.relay.as_mut() {
            relay.finish();
        }
        if let Some(receiver) = self.receiver.as_mut() {
            receiver.finish();
        }
    }
    
    /// Forwards every role's scalars to `sink` as `<module>.<role>`.
    pub fn flush_telemetry(&self, module: &str, sink: &mut dyn TelemetrySink) {
        if let Some(originator) = &self.originator {
            originator.scalars().flush_to(&format!("{}.originator", module), sink);
        }
        if let Some(relay) = &self.relay {
            relay.scalars().flush_to(&format!("{}.relay", module), sink);
        }
        if let Some(receiver) = &self.receiver {
            receiver.scalars().flush_to(&format!("{}.receiver", module), sink);
        }
    }
    
    pub fn originator(&self) -> Option<&Originator> {
        self.originator.as_ref()
    }
    
    pub fn relay(&self) -> Option<&Relay> {
        self.relay.as_ref()
    }
    
    pub fn receiver(&self) -> Option<&Receiver> {
        self.receiver.as_ref()
    }
    
    pub fn network(&self) -> &Arc<Net> {
        &self.network
    }
}
