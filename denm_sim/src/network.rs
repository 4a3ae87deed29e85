//! Simulated broadcast transport with range gating and fault injection.

use denm_core::DisseminationMessage;
use denm_env::{BroadcastTransport, EnvError, NetworkController, Position, StationId, TrafficClass};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;

/// Simulated network interface for a station.
///
/// Broadcasts are pushed to the world's central router; the router decides
/// who hears them and when.
pub struct SimNetwork {
    /// This station's ID
    local_id: StationId,
    
    /// Sender to central router
    tx: mpsc::UnboundedSender<NetworkMessage>,
}

/// Internal message to the network router.
#[derive(Debug)]
pub struct NetworkMessage {
    pub from: StationId,
    pub sender_position: Position,
    pub class: TrafficClass,
    pub message: DisseminationMessage,
}

impl SimNetwork {
    /// Creates a new simulated network interface.
    pub fn new(local_id: StationId, tx: mpsc::UnboundedSender<NetworkMessage>) -> Self {
        Self { local_id, tx }
    }
    
    /// Creates a stub network for testing (broadcasts go nowhere).
    pub fn new_stub(local_id: StationId) -> Self {
        let (tx, _) = mpsc::unbounded_channel();
        Self { local_id, tx }
    }
}

impl BroadcastTransport<DisseminationMessage> for SimNetwork {
    fn broadcast_single_hop(
        &self,
        message: DisseminationMessage,
        sender_position: Position,
        class: TrafficClass,
    ) -> Result<(), EnvError> {
        let msg = NetworkMessage {
            from: self.local_id,
            sender_position,
            class,
            message,
        };
        
        self.tx.send(msg).map_err(|_| EnvError::network("Channel closed"))
    }
    
    fn local_id(&self) -> StationId {
        self.local_id
    }
}

/// Network controller for range, latency and partitions.
pub struct SimNetworkController {
    /// Range used for stations without an explicit one (meters)
    default_range_m: f64,
    
    /// Latency used when nothing more specific is set
    default_latency: Duration,
    
    /// Per-station broadcast range in meters
    ranges: Mutex<HashMap<StationId, f64>>,
    
    /// Per-sender latency (e.g. satellite downlink)
    sender_latency: Mutex<HashMap<StationId, Duration>>,
    
    /// Per-link latency, overrides the sender latency
    link_latency: Mutex<HashMap<(StationId, StationId), Duration>>,
    
    /// Active partitions (stations that cannot hear each other)
    partitions: Mutex<Vec<(Vec<StationId>, Vec<StationId>)>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A poisoned lock only means another test thread panicked mid-update
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl SimNetworkController {
    /// Creates a new network controller.
    pub fn new(default_range_m: f64, default_latency: Duration) -> Self {
        Self {
            default_range_m,
            default_latency,
            ranges: Mutex::new(HashMap::new()),
            sender_latency: Mutex::new(HashMap::new()),
            link_latency: Mutex::new(HashMap::new()),
            partitions: Mutex::new(Vec::new()),
        }
    }
    
    /// Sets the latency of everything `from` sends.
    pub fn set_sender_latency(&self, from: StationId, latency: Duration) {
        lock(&self.sender_latency).insert(from, latency);
    }
    
    /// Broadcast range of a station in meters.
    pub fn broadcast_range(&self, station: StationId) -> f64 {
        lock(&self.ranges).get(&station).copied().unwrap_or(self.default_range_m)
    }
    
    /// Checks if two stations can hear each other (not partitioned).
    pub fn can_communicate(&self, from: StationId, to: StationId) -> bool {
        let partitions = lock(&self.partitions);
        
        for (group_a, group_b) in partitions.iter() {
            let from_in_a = group_a.contains(&from);
            let from_in_b = group_b.contains(&from);
            let to_in_a = group_a.contains(&to);
            let to_in_b = group_b.contains(&to);
            
            if (from_in_a && to_in_b) || (from_in_b && to_in_a) {
                return false;
            }
        }
        
        true
    }
    
    /// True if `to` at `receiver_position` hears a broadcast `from` sent at
    /// `sender_position`.
    pub fn in_range(&self, from: StationId, sender_position: Position, receiver_position: Position) -> bool {
        (receiver_position - sender_position).norm() <= self.broadcast_range(from)
    }
    
    /// Gets the latency for a link: link override, then sender, then default.
    pub fn get_latency(&self, from: StationId, to: StationId) -> Duration {
        if let Some(latency) = lock(&self.link_latency).get(&(from, to)) {
            return *latency;
        }
        lock(&self.sender_latency)
            .get(&from)
            .copied()
            .unwrap_or(self.default_latency)
    }
}

impl NetworkController for SimNetworkController {
    fn partition(&self, group_a: &[StationId], group_b: &[StationId]) {
        lock(&self.partitions).push((group_a.to_vec(), group_b.to_vec()));
    }
    
    fn heal_all(&self) {
        lock(&self.partitions).clear();
    }
    
    fn set_link_latency(&self, from: StationId, to: StationId, latency: Duration) {
        lock(&self.link_latency).insert((from, to), latency);
    }
    
    fn set_broadcast_range(&self, station: StationId, range_m: f64) {
        lock(&self.ranges).insert(station, range_m.max(0.0));
    }
}

impl Default for SimNetworkController {
    fn default() -> Self {
        Self::new(500.0, Duration::from_millis(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use denm_core::EventType;
    use denm_env::SimTime;
    
    #[test]
    fn test_network_controller_partition() {
        let controller = SimNetworkController::default();
        
        let a = StationId::from_seed(1);
        let b = StationId::from_seed(2);
        let c = StationId::from_seed(3);
        
        // Initially all can communicate
        assert!(controller.can_communicate(a, b));
        assert!(controller.can_communicate(a, c));
        assert!(controller.can_communicate(b, c));
        
        // Partition: {a} vs {b, c}
        controller.partition(&[a], &[b, c]);
        
        assert!(!controller.can_communicate(a, b));
        assert!(!controller.can_communicate(c, a));
        
        // But b and c can still talk
        assert!(controller.can_communicate(b, c));
        
        controller.heal_all();
        assert!(controller.can_communicate(a, b));
    }
    
    #[test]
    fn test_network_controller_latency_precedence() {
        let controller = SimNetworkController::new(500.0, Duration::from_millis(2));
        
        let a = StationId::from_seed(1);
        let b = StationId::from_seed(2);
        
        assert_eq!(controller.get_latency(a, b), Duration::from_millis(2));
        
        controller.set_sender_latency(a, Duration::from_millis(270));
        assert_eq!(controller.get_latency(a, b), Duration::from_millis(270));
        
        controller.set_link_latency(a, b, Duration::from_millis(9));
        assert_eq!(controller.get_latency(a, b), Duration::from_millis(9));
        
        // Reverse direction is separate
        assert_eq!(controller.get_latency(b, a), Duration::from_millis(2));
    }
    
    #[test]
    fn test_range_gate() {
        let controller = SimNetworkController::new(500.0, Duration::ZERO);
        let a = StationId::from_seed(1);
        let origin = Position::zeros();
        
        assert!(controller.in_range(a, origin, Position::new(300.0, 400.0)));
        assert!(!controller.in_range(a, origin, Position::new(300.0, 401.0)));
        
        controller.set_broadcast_range(a, 50_000.0);
        assert!(controller.in_range(a, origin, Position::new(30_000.0, 0.0)));
    }
    
    #[test]
    fn test_broadcast_reaches_router() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = StationId::from_seed(4);
        let net = SimNetwork::new(id, tx);
        
        let msg = DisseminationMessage::new(id, 1, SimTime::ZERO, SimTime::ZERO, EventType::Crash, Position::zeros());
        net.broadcast_single_hop(msg, Position::new(1.0, 2.0), TrafficClass::Emergency).unwrap();
        
        let routed = rx.try_recv().unwrap();
        assert_eq!(routed.from, id);
        assert_eq!(routed.sender_position, Position::new(1.0, 2.0));
        assert_eq!(routed.message.sequence_number(), 1);
    }
    
    #[test]
    fn test_stub_reports_closed_channel() {
        let id = StationId::from_seed(5);
        let net = SimNetwork::new_stub(id);
        let msg = DisseminationMessage::new(id, 1, SimTime::ZERO, SimTime::ZERO, EventType::Crash, Position::zeros());
        
        assert!(net.broadcast_single_hop(msg, Position::zeros(), TrafficClass::Emergency).is_err());
    }
}
