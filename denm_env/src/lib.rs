//! DENM Environment Abstraction Layer
//!
//! This crate provides the seams between the dissemination protocol core
//! and whatever drives it: a discrete-event harness in simulation, or a
//! real radio stack elsewhere.
//!
//! # Core Concept: Explicit Collaborators
//!
//! The protocol core never reaches for globals. Everything that would
//! otherwise be ambient is passed in:
//! - Time (`SimTime`, handed to every handler as `now`)
//! - Network (`BroadcastTransport::broadcast_single_hop()`)
//! - Randomness (`DisseminationContext::derive_rng()`)
//! - Recording (`TelemetrySink::record_scalar()`)
//!
//! By deriving all entropy from a single 64-bit seed, any run becomes
//! reproducible via its seed number.
//!
//! # Example
//!
//! ```ignore
//! use denm_env::{BroadcastTransport, Position, TrafficClass};
//!
//! fn announce<Net: BroadcastTransport<Msg>>(net: &Net, msg: Msg, pos: Position) {
//!     if let Err(e) = net.broadcast_single_hop(msg, pos, TrafficClass::Emergency) {
//!         tracing::warn!("broadcast lost: {}", e);
//!     }
//! }
//! ```

mod context;
mod network;
mod telemetry;
mod types;
mod error;

pub use context::DisseminationContext;
pub use network::{BroadcastTransport, NetworkController};
pub use telemetry::TelemetrySink;
pub use types::{secs_to_duration, Position, SimTime, StationId, TrafficClass};
pub use error::EnvError;
