//! Receiver - records how (and whether) a DENM reached a vehicle in time.
//!
//! ```text
//!   NEVER_RECEIVED ──(first non-self reception)──► RECEIVED (latched)
//! ```
//!
//! Only the first qualifying reception produces latency scalars. Every
//! qualifying reception, including relayed echoes of the same message,
//! bumps the total counter. The terminal classification is resolved by
//! [`Receiver::finish`].

use crate::config::ReceiverConfig;
use crate::error::ConfigError;
use crate::message::DisseminationMessage;
use crate::telemetry::{names, ScalarRecord};
use denm_env::{SimTime, StationId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Result of handing one message to a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceptionOutcome {
    /// Our own broadcast (direct or relayed); ignored
    SelfOriginated,
    
    /// First qualifying reception; latency recorded
    First {
        delay: Duration,
        within_deadline: bool,
    },
    
    /// Counted, but the latency record is already latched
    Repeat,
}

/// Run-end classification of a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryClass {
    /// Received with delay <= deadline
    WithinDeadline,
    
    /// Received, but after the deadline
    Late,
    
    /// Never received. Attributed to coverage even when a relay's
    /// reliability draw was the actual cause.
    OutOfCoverage,
}

/// The latched first reception.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstReception {
    pub reception_time: SimTime,
    pub event_time: SimTime,
    pub delay: Duration,
    pub within_deadline: bool,
    
    /// Relay tag of the copy that got here first
    pub relay_origin: String,
}

/// Receiver state for one vehicle.
#[derive(Debug, Clone)]
pub struct Receiver {
    station_id: StationId,
    
    deadline: Duration,
    
    first: Option<FirstReception>,
    
    /// Most recent qualifying reception (reception time, event time)
    last: Option<(SimTime, SimTime)>,
    
    /// Every qualifying reception
    received_count: u64,
    
    scalars: ScalarRecord,
    
    finished: bool,
}

impl Receiver {
    /// Creates a receiver, validating its deadline.
    pub fn new(station_id: StationId, config: ReceiverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        
        debug!("{}: receiver initialized (deadline={}s)", station_id, config.denm_deadline_secs);
        
        Ok(Self {
            station_id,
            deadline: config.deadline(),
            first: None,
            last: None,
            received_count: 0,
            scalars: ScalarRecord::new(),
            finished: false,
        })
    }
    
    /// Handles a DENM heard on the air.
    pub fn on_receive(&mut self, msg: &DisseminationMessage, now: SimTime) -> ReceptionOutcome {
        if msg.station_id() == self.station_id {
            debug!("{}: own DENM {} dropped", self.station_id, msg.id());
            return ReceptionOutcome::SelfOriginated;
        }
        
        let event_time = msg.event_time();
        let delay = now.duration_since(event_time);
        self.last = Some((now, event_time));
        self.received_count += 1;
        
        debug!(
            "{}: DENM from {} type={} delay={:.6}s via {}",
            self.station_id,
            msg.station_id(),
            msg.event_type(),
            delay.as_secs_f64(),
            msg.relay_origin()
        );
        
        if self.first.is_some() {
            return ReceptionOutcome::Repeat;
        }
        
        let within_deadline = delay <= self.deadline;
        info!(
            "{}: first DENM received at {} (delay={:.6}s, within_deadline={})",
            self.station_id,
            now,
            delay.as_secs_f64(),
            within_deadline
        );
        
        self.scalars.record_flag(names::DENM_RECEIVED_FLAG, true);
        self.scalars.record_time(names::DENM_RECEPTION_TIME, now);
        self.scalars.record_time(names::DENM_EVENT_TIME, event_time);
        self.scalars.record_duration(names::DENM_RECEPTION_DELAY, delay);
        self.scalars.record_flag(names::DENM_WITHIN_DEADLINE, within_deadline);
        self.scalars.record_flag(names::DENM_IN_COVERAGE, true);
        self.scalars.record_flag(names::DENM_OUT_OF_COVERAGE, false);
        self.scalars.record_flag(names::DENM_RELIABILITY_DROP, false);
        
        self.first = Some(FirstReception {
            reception_time: now,
            event_time,
            delay,
            within_deadline,
            relay_origin: msg.relay_origin().to_string(),
        });
        
        ReceptionOutcome::First { delay, within_deadline }
    }
    
    /// End-of-run bookkeeping.
    ///
    /// A vehicle that heard nothing is reported as out of coverage with no
    /// reliability drop; the true cause is not inferred.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        
        if self.first.is_none() {
            info!("{}: never received DENM - recording as out of coverage", self.station_id);
            self.scalars.record_flag(names::DENM_RECEIVED_FLAG, false);
            self.scalars.record(names::DENM_RECEPTION_TIME, 0.0);
            self.scalars.record(names::DENM_EVENT_TIME, 0.0);
            self.scalars.record(names::DENM_RECEPTION_DELAY, 0.0);
            self.scalars.record_flag(names::DENM_WITHIN_DEADLINE, false);
            self.scalars.record_flag(names::DENM_IN_COVERAGE, false);
            self.scalars.record_flag(names::DENM_OUT_OF_COVERAGE, true);
            self.scalars.record_flag(names::DENM_RELIABILITY_DROP, false);
        }
        
        self.scalars.record(names::DENMS_RECEIVED, self.received_count as f64);
        debug!("{}: receiver finished - received {} DENMs", self.station_id, self.received_count);
    }
    
    /// Current classification (final once the run has ended).
    pub fn classification(&self) -> DeliveryClass {
        match &self.first {
            Some(first) if first.within_deadline => DeliveryClass::WithinDeadline,
            Some(_) => DeliveryClass::Late,
            None => DeliveryClass::OutOfCoverage,
        }
    }
    
    pub fn station_id(&self) -> StationId {
        self.station_id
    }
    
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
    
    pub fn has_received(&self) -> bool {
        self.first.is_some()
    }
    
    pub fn first_reception(&self) -> Option<&FirstReception> {
        self.first.as_ref()
    }
    
    /// Most recent qualifying reception as (reception time, event time).
    pub fn last_reception(&self) -> Option<(SimTime, SimTime)> {
        self.last
    }
    
    pub fn received_count(&self) -> u64 {
        self.received_count
    }
    
    pub fn scalars(&self) -> &ScalarRecord {
        &self.scalars
    }
}
