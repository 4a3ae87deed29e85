//! SimWorld - the discrete-event container for a dissemination run.
//!
//! One timeline, one queue. Every handler runs to completion before the
//! next event is popped; broadcasts land in the central router and are fanned
//! out to every station in range as future deliveries.
//!
//! ```text
//!   queue (time, seq) ──pop──► dispatch ──► Agent::on_trigger / on_receive
//!        ▲                                        │
//!        │                                        ▼ broadcast_single_hop
//!        └──── schedule Deliver(now + latency) ◄── router (range, partitions)
//! ```

use crate::agent::{SimulatedStation, StationKind};
use crate::context::SimContext;
use crate::error::SimError;
use crate::mobility::Mobility;
use crate::network::{NetworkMessage, SimNetwork, SimNetworkController};
use crate::recorder::ScalarStore;
use crate::scenarios::InfrastructureProfile;
use crate::storyboard::{Effect, Storyboard};

use denm_core::{DisseminationMessage, ReceiverConfig, TriggerCause};
use denm_env::{
    secs_to_duration, DisseminationContext, NetworkController, Position, SimTime, StationId,
};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

/// RNG stream for vehicle speeds.
const MOBILITY_STREAM: u64 = 0;

/// First RNG stream handed to relays (one stream per relay).
const RELAY_STREAM_BASE: u64 = 1;

/// Seed offset for relay station IDs, clear of vehicle IDs.
const RELAY_ID_BASE: u64 = 1 << 32;

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,
    
    /// Number of vehicles on the road
    pub num_vehicles: usize,
    
    /// Relays per infrastructure type
    pub num_relays: usize,
    
    /// Initial gap between consecutive vehicles (meters)
    pub vehicle_spacing_m: f64,
    
    /// Mean vehicle speed (m/s)
    pub mean_speed_mps: f64,
    
    /// Vehicle speed standard deviation (m/s)
    pub speed_std_mps: f64,
    
    /// Vehicle radio range (meters)
    pub vehicle_range_m: f64,
    
    /// Vehicle-to-anything latency (seconds)
    pub vehicle_link_latency_secs: f64,
    
    /// Simulated duration (seconds)
    pub duration_secs: f64,
    
    /// When the accident happens (seconds)
    pub crash_time_secs: f64,
    
    /// Witness reaction delay (seconds)
    pub witness_delay_secs: f64,
    
    /// Receiver usefulness deadline (seconds)
    pub deadline_secs: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_vehicles: 20,
            num_relays: 1,
            vehicle_spacing_m: 40.0,
            mean_speed_mps: 25.0,
            speed_std_mps: 1.0,
            vehicle_range_m: 500.0,
            vehicle_link_latency_secs: 0.002,
            duration_secs: 210.0,
            crash_time_secs: 200.0,
            witness_delay_secs: 3.0,
            deadline_secs: 0.5,
        }
    }
}

impl SimConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
    
    pub fn with_vehicles(mut self, num_vehicles: usize) -> Self {
        self.num_vehicles = num_vehicles;
        self
    }
    
    pub fn with_relays(mut self, num_relays: usize) -> Self {
        self.num_relays = num_relays;
        self
    }
    
    pub fn with_spacing(mut self, spacing_m: f64) -> Self {
        self.vehicle_spacing_m = spacing_m;
        self
    }
    
    pub fn with_speed(mut self, mean_mps: f64, std_mps: f64) -> Self {
        self.mean_speed_mps = mean_mps;
        self.speed_std_mps = std_mps;
        self
    }
    
    pub fn with_vehicle_range(mut self, range_m: f64) -> Self {
        self.vehicle_range_m = range_m;
        self
    }
    
    pub fn with_link_latency(mut self, secs: f64) -> Self {
        self.vehicle_link_latency_secs = secs;
        self
    }
    
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = secs;
        self
    }
    
    pub fn with_crash_time(mut self, secs: f64) -> Self {
        self.crash_time_secs = secs;
        self
    }
    
    pub fn with_witness_delay(mut self, secs: f64) -> Self {
        self.witness_delay_secs = secs;
        self
    }
    
    pub fn with_deadline(mut self, secs: f64) -> Self {
        self.deadline_secs = secs;
        self
    }
    
    /// Rejects values no run can be built from.
    pub fn validate(&self) -> Result<(), SimError> {
        let non_negative = [
            ("vehicle_spacing_m", self.vehicle_spacing_m),
            ("mean_speed_mps", self.mean_speed_mps),
            ("speed_std_mps", self.speed_std_mps),
            ("vehicle_range_m", self.vehicle_range_m),
            ("vehicle_link_latency_secs", self.vehicle_link_latency_secs),
            ("duration_secs", self.duration_secs),
            ("crash_time_secs", self.crash_time_secs),
            ("witness_delay_secs", self.witness_delay_secs),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidParameter(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        
        ReceiverConfig::with_deadline(self.deadline_secs).validate()?;
        Ok(())
    }
    
    pub fn receiver_config(&self) -> ReceiverConfig {
        ReceiverConfig::with_deadline(self.deadline_secs)
    }
}

/// Router counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    /// Broadcasts handed to the router
    pub broadcasts: u64,
    
    /// Deliveries scheduled (one per in-range listener)
    pub deliveries_scheduled: u64,
    
    /// Deliveries handed to an agent
    pub deliveries: u64,
    
    /// Listeners skipped for being out of range
    pub out_of_range: u64,
    
    /// Listeners skipped because of a partition
    pub partitioned: u64,
}

enum EventKind {
    Stop {
        target: StationId,
    },
    Signal {
        target: StationId,
        cause: String,
    },
    Deliver {
        to: StationId,
        message: Arc<DisseminationMessage>,
    },
}

struct ScheduledEvent {
    at: SimTime,
    /// Insertion order, breaks ties at equal times
    seq: u64,
    kind: EventKind,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.at, self.seq).cmp(&(other.at, other.seq))
    }
}

/// Everything a finished world hands back.
#[derive(Debug, Clone)]
pub struct WorldReport {
    /// Run-end scalars of every station
    pub scalars: ScalarStore,
    
    pub metrics: NetworkMetrics,
    
    /// Events popped from the queue
    pub events_processed: u64,
    
    pub final_time: SimTime,
}

/// The SimWorld - container for the entire simulation.
pub struct SimWorld {
    /// Configuration
    pub config: SimConfig,
    
    /// Shared simulation context (virtual clock)
    pub context: Arc<SimContext>,
    
    /// Ground truth positions
    pub mobility: Mobility,
    
    /// Network controller for range, latency and partitions
    pub network_controller: SimNetworkController,
    
    /// Stations keyed by ID (ordered, so fan-out order is reproducible)
    stations: BTreeMap<StationId, SimulatedStation>,
    
    /// Creation order, used for recording
    order: Vec<StationId>,
    
    /// Central router sender (cloned into every SimNetwork)
    router_tx: mpsc::UnboundedSender<NetworkMessage>,
    
    /// Central router receiver
    router_rx: mpsc::UnboundedReceiver<NetworkMessage>,
    
    queue: BinaryHeap<Reverse<ScheduledEvent>>,
    next_seq: u64,
    
    vehicle_count: usize,
    relay_count: u64,
    relay_indices: HashMap<&'static str, usize>,
    
    metrics: NetworkMetrics,
    events_processed: u64,
}

impl SimWorld {
    /// Creates a new SimWorld with the given configuration.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        
        let context = SimContext::shared(config.seed);
        let mobility = Mobility::new(
            context.derive_rng(MOBILITY_STREAM),
            config.mean_speed_mps,
            config.speed_std_mps,
        )?;
        let network_controller = SimNetworkController::new(
            config.vehicle_range_m,
            secs_to_duration(config.vehicle_link_latency_secs),
        );
        
        let (router_tx, router_rx) = mpsc::unbounded_channel::<NetworkMessage>();
        
        Ok(Self {
            config,
            context,
            mobility,
            network_controller,
            stations: BTreeMap::new(),
            order: Vec::new(),
            router_tx,
            router_rx,
            queue: BinaryHeap::new(),
            next_seq: 0,
            vehicle_count: 0,
            relay_count: 0,
            relay_indices: HashMap::new(),
            metrics: NetworkMetrics::default(),
            events_processed: 0,
        })
    }
    
    /// Places a vehicle at `origin`. It listens, and originates on `trigger`.
    pub fn add_vehicle(
        &mut self,
        origin: Position,
        trigger: Option<TriggerCause>,
    ) -> Result<StationId, SimError> {
        let index = self.vehicle_count;
        let id = StationId::from_seed(index as u64);
        let network = Arc::new(SimNetwork::new(id, self.router_tx.clone()));
        
        let station = SimulatedStation::vehicle(
            network,
            index,
            origin,
            self.config.receiver_config(),
            trigger,
        )?;
        
        let speed = self.mobility.spawn_vehicle(id, origin);
        debug!("Spawned {} ({}) at x={:.1} speed={:.2}m/s", station.module(), id, origin.x, speed);
        
        self.insert(station);
        self.vehicle_count += 1;
        Ok(id)
    }
    
    /// Places a relay node at `position` with the profile's radio.
    pub fn add_relay(
        &mut self,
        profile: &InfrastructureProfile,
        position: Position,
    ) -> Result<StationId, SimError> {
        let index = self.relay_indices.get(profile.module_prefix).copied().unwrap_or(0);
        let id = StationId::from_seed(RELAY_ID_BASE + self.relay_count);
        let network = Arc::new(SimNetwork::new(id, self.router_tx.clone()));
        let rng = self.context.derive_rng(RELAY_STREAM_BASE + self.relay_count);
        
        let station = SimulatedStation::infrastructure(network, index, position, profile, rng)?;
        
        self.network_controller.set_broadcast_range(id, profile.broadcast_range_m);
        self.network_controller.set_sender_latency(id, profile.downlink_latency);
        self.mobility.spawn_static(id, position);
        debug!(
            "Placed {} ({}) at ({:.1}, {:.1}) range={:.0}m",
            station.module(),
            id,
            position.x,
            position.y,
            profile.broadcast_range_m
        );
        
        self.insert(station);
        self.relay_indices.insert(profile.module_prefix, index + 1);
        self.relay_count += 1;
        Ok(id)
    }
    
    fn insert(&mut self, station: SimulatedStation) {
        let id = station.station_id();
        self.order.push(id);
        self.stations.insert(id, station);
    }
    
    /// Queues every effect of every story.
    pub fn apply_storyboard(&mut self, storyboard: &Storyboard) {
        for story in storyboard.stories() {
            for effect in &story.effects {
                let kind = match effect {
                    Effect::Stop => EventKind::Stop { target: story.target },
                    Effect::Signal(cause) => EventKind::Signal {
                        target: story.target,
                        cause: cause.clone(),
                    },
                };
                self.schedule(story.at, kind);
            }
        }
    }
    
    fn schedule(&mut self, at: SimTime, kind: EventKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(ScheduledEvent { at, seq, kind }));
    }
    
    /// Processes every event due at or before `end`, then parks the clock
    /// at `end`.
    pub fn run_until(&mut self, end: SimTime) {
        loop {
            self.route_pending();
            
            let due = matches!(self.queue.peek(), Some(Reverse(event)) if event.at <= end);
            if !due {
                break;
            }
            let Some(Reverse(event)) = self.queue.pop() else {
                break;
            };
            
            self.context.set_time(event.at);
            self.dispatch(event.kind);
            self.events_processed += 1;
        }
        
        self.context.set_time(end);
    }
    
    /// Fans pending broadcasts out to every listener in range.
    fn route_pending(&mut self) {
        let now = self.context.now();
        
        while let Ok(msg) = self.router_rx.try_recv() {
            self.metrics.broadcasts += 1;
            let message = Arc::new(msg.message);
            let mut deliveries = Vec::new();
            
            for &to in self.stations.keys() {
                if to == msg.from {
                    continue;
                }
                if !self.network_controller.can_communicate(msg.from, to) {
                    self.metrics.partitioned += 1;
                    continue;
                }
                let Some(position) = self.mobility.position(to, now) else {
                    continue;
                };
                if !self.network_controller.in_range(msg.from, msg.sender_position, position) {
                    self.metrics.out_of_range += 1;
                    continue;
                }
                deliveries.push((to, now + self.network_controller.get_latency(msg.from, to)));
            }
            
            trace!(
                "Broadcast {} from {} ({:?}) -> {} listeners",
                message.id(),
                msg.from,
                msg.class,
                deliveries.len()
            );
            
            for (to, at) in deliveries {
                self.metrics.deliveries_scheduled += 1;
                self.schedule(
                    at,
                    EventKind::Deliver {
                        to,
                        message: Arc::clone(&message),
                    },
                );
            }
        }
    }
    
    fn dispatch(&mut self, kind: EventKind) {
        let now = self.context.now();
        
        match kind {
            EventKind::Stop { target } => {
                if self.mobility.stop(target, now) {
                    info!("{}: stopped at {}", target, now);
                }
                self.sync_position(target, now);
            }
            EventKind::Signal { target, cause } => {
                self.sync_position(target, now);
                match self.stations.get_mut(&target) {
                    Some(station) => {
                        station.agent_mut().on_trigger(&cause, now);
                    }
                    None => debug!("Signal {} for unknown station {}", cause, target),
                }
            }
            EventKind::Deliver { to, message } => {
                self.sync_position(to, now);
                if let Some(station) = self.stations.get_mut(&to) {
                    station.agent_mut().on_receive(&message, now);
                    self.metrics.deliveries += 1;
                }
            }
        }
    }
    
    fn sync_position(&mut self, id: StationId, now: SimTime) {
        if let (Some(position), Some(station)) =
            (self.mobility.position(id, now), self.stations.get_mut(&id))
        {
            station.agent_mut().set_position(position);
        }
    }
    
    /// Ends the run: every role finishes, then all scalars are recorded in
    /// creation order.
    pub fn finish(mut self) -> WorldReport {
        // Broadcasts made by the last handler are counted even if never delivered
        self.route_pending();
        
        let mut scalars = ScalarStore::new();
        for id in &self.order {
            if let Some(station) = self.stations.get_mut(id) {
                station.agent_mut().finish();
                station.agent().flush_telemetry(station.module(), &mut scalars);
            }
        }
        
        info!(
            "World finished at {}: {} events, {} broadcasts, {} deliveries",
            self.context.now(),
            self.events_processed,
            self.metrics.broadcasts,
            self.metrics.deliveries
        );
        
        WorldReport {
            scalars,
            metrics: self.metrics,
            events_processed: self.events_processed,
            final_time: self.context.now(),
        }
    }
    
    /// Returns the current simulation time.
    pub fn time(&self) -> SimTime {
        self.context.now()
    }
    
    pub fn station(&self, id: StationId) -> Option<&SimulatedStation> {
        self.stations.get(&id)
    }
    
    /// Stations in creation order.
    pub fn stations(&self) -> impl Iterator<Item = &SimulatedStation> + '_ {
        self.order.iter().filter_map(|id| self.stations.get(id))
    }
    
    pub fn station_count(&self) -> usize {
        self.stations.len()
    }
    
    pub fn count_of(&self, kind: StationKind) -> usize {
        self.stations.values().filter(|s| s.kind() == kind).count()
    }
    
    pub fn metrics(&self) -> NetworkMetrics {
        self.metrics
    }
    
    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }
}
