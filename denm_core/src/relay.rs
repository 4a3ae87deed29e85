//! Relay - infrastructure node (antenna, satellite) that re-broadcasts DENMs.
//!
//! # Pipeline per received message
//!
//! ```text
//!  on_receive(msg)
//!     │
//!     ├─ msg already relayed? ────────────────► AlreadyRelayed (silent)
//!     ├─ id ∈ seen? ──────────────────────────► Duplicate (silent)
//!     │
//!     ├─ seen += id
//!     ├─ first ever? ──► record cloud delivery (once per run)
//!     │
//!     └─ r ~ U[0,1)
//!          ├─ r <= reliability ──► broadcast msg.relayed_by(type) ──► Relayed
//!          └─ otherwise ─────────────────────────────────────────► ReliabilityDrop
//! ```
//!
//! Exactly one draw is taken per accepted (non-duplicate) message, from an
//! RNG stream owned by this node. Multiple relays in range of the same
//! originator therefore fail or succeed independently.
//!
//! Copies re-broadcast by another relay are never accepted, so a DENM
//! crosses at most one infrastructure hop.

use crate::config::RelayConfig;
use crate::error::ConfigError;
use crate::message::{DisseminationMessage, MessageId};
use crate::telemetry::{names, ScalarRecord};
use denm_env::{BroadcastTransport, Position, SimTime, StationId, TrafficClass};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What a relay did with one received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Copy re-broadcast by another relay; dropped without telemetry
    AlreadyRelayed,
    
    /// Already seen; dropped without telemetry
    Duplicate,
    
    /// Re-broadcast with this node's infrastructure tag
    Relayed,
    
    /// Accepted but lost to the reliability draw
    ReliabilityDrop,
    
    /// Passed the draw but the transport refused the broadcast
    TransportLost,
}

/// First message to reach the cloud through this node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudDelivery {
    /// Event time carried by the message
    pub event_time: SimTime,
    
    /// Reception time plus processing latency
    pub delivery_time: SimTime,
}

impl CloudDelivery {
    /// Time from hazard to cloud.
    pub fn latency(&self) -> Duration {
        self.delivery_time.duration_since(self.event_time)
    }
}

/// Running counters for one relay node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Non-duplicate receptions
    pub accepted: u64,
    
    /// Receptions dropped by the dedup gate
    pub duplicates: u64,
    
    /// Other relays' re-broadcasts heard and ignored
    pub relayed_copies: u64,
    
    /// Successful re-broadcasts
    pub relayed: u64,
    
    /// Accepted messages lost to the reliability draw
    pub reliability_drops: u64,
}

/// Relay state for one infrastructure node.
pub struct Relay {
    station_id: StationId,
    
    config: RelayConfig,
    
    /// Every message id accepted so far; grows for the whole run
    seen: HashSet<MessageId>,
    
    /// Set on the first non-duplicate reception
    cloud_delivery: Option<CloudDelivery>,
    
    stats: RelayStats,
    
    /// Reliability draws
    rng: ChaCha8Rng,
    
    scalars: ScalarRecord,
    
    finished: bool,
}

impl Relay {
    /// Creates a relay node, validating its configuration.
    pub fn new(station_id: StationId, config: RelayConfig, rng: ChaCha8Rng) -> Result<Self, ConfigError> {
        config.validate()?;
        
        info!(
            "{}: relay initialized (type={} latency={}s coverage={}m reliability={}%)",
            station_id,
            config.infrastructure_type,
            config.latency_secs,
            config.coverage_radius_m,
            config.coverage_reliability * 100.0
        );
        
        Ok(Self {
            station_id,
            config,
            seen: HashSet::new(),
            cloud_delivery: None,
            stats: RelayStats::default(),
            rng,
            scalars: ScalarRecord::new(),
            finished: false,
        })
    }
    
    /// Handles a DENM heard on the air.
    ///
    /// The received message is always consumed; only a re-tagged copy is
    /// ever broadcast.
    pub fn on_receive<Net>(
        &mut self,
        msg: &DisseminationMessage,
        now: SimTime,
        position: Position,
        network: &Net,
    ) -> RelayOutcome
    where
        Net: BroadcastTransport<DisseminationMessage> + ?Sized,
    {
        let id = msg.id();
        if msg.is_relayed() {
            debug!(
                "{}: DENM {} already relayed via {}, ignored",
                self.station_id, id, msg.relay_origin()
            );
            self.stats.relayed_copies += 1;
            return RelayOutcome::AlreadyRelayed;
        }
        
        if !self.seen.insert(id) {
            debug!("{}: duplicate DENM {} ignored", self.station_id, id);
            self.stats.duplicates += 1;
            return RelayOutcome::Duplicate;
        }
        self.stats.accepted += 1;
        
        debug!(
            "{}: received DENM {} type={} at {}",
            self.station_id, id, msg.event_type(), now
        );
        
        if self.cloud_delivery.is_none() {
            self.record_cloud_delivery(msg, now);
        }
        
        let draw: f64 = self.rng.gen();
        if draw > self.config.coverage_reliability {
            debug!("{}: DENM {} dropped by reliability draw ({:.4})", self.station_id, id, draw);
            self.stats.reliability_drops += 1;
            return RelayOutcome::ReliabilityDrop;
        }
        
        let relayed = msg.relayed_by(&self.config.infrastructure_type);
        match network.broadcast_single_hop(relayed, position, TrafficClass::Emergency) {
            Ok(()) => {
                debug!(
                    "{}: DENM {} relayed via {} (coverage={}m)",
                    self.station_id, id, self.config.infrastructure_type, self.config.coverage_radius_m
                );
                self.stats.relayed += 1;
                RelayOutcome::Relayed
            }
            Err(e) => {
                warn!("{}: relay broadcast of {} lost: {}", self.station_id, id, e);
                RelayOutcome::TransportLost
            }
        }
    }
    
    fn record_cloud_delivery(&mut self, msg: &DisseminationMessage, now: SimTime) {
        let delivery = CloudDelivery {
            event_time: msg.event_time(),
            delivery_time: now + self.config.latency(),
        };
        
        info!(
            "{}: cloud delivery latency {:.6}s",
            self.station_id,
            delivery.latency().as_secs_f64()
        );
        
        self.scalars.record(names::CLOUD_RECEIVED_FLAG, 1.0);
        self.scalars.record_time(names::CLOUD_RECEPTION_TIME, delivery.delivery_time);
        self.scalars.record_time(names::CLOUD_EVENT_TIME, delivery.event_time);
        self.scalars.record_duration(names::CLOUD_DELIVERY_LATENCY, delivery.latency());
        self.record_coverage_config();
        
        self.cloud_delivery = Some(delivery);
    }
    
    fn record_coverage_config(&mut self) {
        self.scalars.record(names::INFRA_COVERAGE_RADIUS, self.config.coverage_radius_m);
        self.scalars.record(names::INFRA_COVERAGE_RELIABILITY, self.config.coverage_reliability);
    }
    
    /// End-of-run bookkeeping: relay count, plus placeholders when nothing
    /// ever arrived so the scalar set has the same shape in every run.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        
        self.scalars.record(names::DENMS_RELAYED, self.stats.relayed as f64);
        
        if self.cloud_delivery.is_some() {
            info!("{}: relay finished - relayed {} DENMs", self.station_id, self.stats.relayed);
        } else {
            info!("{}: relay finished - no DENMs received", self.station_id);
            self.scalars.record(names::CLOUD_RECEIVED_FLAG, 0.0);
            self.scalars.record(names::CLOUD_RECEPTION_TIME, 0.0);
            self.scalars.record(names::CLOUD_EVENT_TIME, 0.0);
            self.scalars.record(names::CLOUD_DELIVERY_LATENCY, 0.0);
            self.record_coverage_config();
        }
    }
    
    pub fn station_id(&self) -> StationId {
        self.station_id
    }
    
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
    
    pub fn cloud_delivery(&self) -> Option<CloudDelivery> {
        self.cloud_delivery
    }
    
    pub fn stats(&self) -> RelayStats {
        self.stats
    }
    
    /// Number of successful re-broadcasts.
    pub fn relayed_count(&self) -> u64 {
        self.stats.relayed
    }
    
    pub fn scalars(&self) -> &ScalarRecord {
        &self.scalars
    }
}
