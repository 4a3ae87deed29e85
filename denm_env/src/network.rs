//! Broadcast transport abstraction for DENM stations.

use crate::error::EnvError;
use crate::types::{Position, StationId, TrafficClass};
use std::time::Duration;

/// Abstraction for single-hop broadcast between stations.
///
/// # Implementations
///
/// - **Simulation**: Channel-routed, range-gated fan-out (`denm_sim::SimNetwork`)
/// - **Production**: Would wrap a GeoNetworking SHB socket
///
/// # Packet Flow
///
/// ```text
/// Station A                  Transport                 Stations in range
///   |                           |                          |
///   |-- broadcast(msg) -------->|                          |
///   |                           |-- [range + latency] ---->|-- on_receive(msg, now)
///   |                           |                          |
/// ```
///
/// The transport is assumed lossless for recipients in range. Loss is
/// modeled explicitly by the protocol core, never by the wire.
pub trait BroadcastTransport<M>: Send + Sync {
    /// Broadcasts a message to every listener within single-hop range of
    /// `sender_position` at the time of the call. No hop limit beyond 1.
    ///
    /// # Returns
    /// * `Ok(())` - Message handed to the transport
    /// * `Err(EnvError::NetworkError)` - Transport is gone (shutdown)
    fn broadcast_single_hop(
        &self,
        message: M,
        sender_position: Position,
        class: TrafficClass,
    ) -> Result<(), EnvError>;
    
    /// Returns this station's ID.
    fn local_id(&self) -> StationId;
}

/// Marker trait for network controllers in simulation.
///
/// Allows shaping who hears whom, and when.
pub trait NetworkController: Send + Sync {
    /// Creates a radio partition between two station sets.
    fn partition(&self, group_a: &[StationId], group_b: &[StationId]);
    
    /// Heals all partitions.
    fn heal_all(&self);
    
    /// Sets latency for a specific directed link.
    fn set_link_latency(&self, from: StationId, to: StationId, latency: Duration);
    
    /// Sets the single-hop broadcast range of a station in meters.
    fn set_broadcast_range(&self, station: StationId, range_m: f64);
}
