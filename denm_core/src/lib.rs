//! DENM Core - Emergency Notification Dissemination Protocol
//!
//! Models how a hazard alert (DENM) travels from the vehicle that raised
//! it, through infrastructure relays, to the vehicles that need it:
//! 1. **Originator**: one trigger, one message, first event wins
//! 2. **Relay**: dedup by (station, sequence), probabilistic re-broadcast
//! 3. **Receiver**: first-reception latency against a usefulness deadline
//!
//! Every handler runs to completion on a single simulated timeline and
//! never fails; only configuration is validated.

pub mod agent;
pub mod config;
pub mod error;
pub mod message;
pub mod originator;
pub mod receiver;
pub mod relay;
pub mod telemetry;

#[cfg(test)]
mod test_support;

// Re-export key types for convenience
pub use agent::{Agent, AgentReception, Capabilities};
pub use config::{ReceiverConfig, RelayConfig};
pub use error::ConfigError;
pub use message::{DisseminationMessage, EventType, MessageId, UNKNOWN_RELAY_ORIGIN};
pub use originator::{Originator, TriggerCause};
pub use receiver::{DeliveryClass, FirstReception, Receiver, ReceptionOutcome};
pub use relay::{CloudDelivery, Relay, RelayOutcome, RelayStats};
pub use telemetry::{names, Scalar, ScalarRecord};
