//! Originator - turns a hazard trigger into exactly one DENM.
//!
//! The crashed vehicle and the witness vehicle run the same state machine;
//! they differ only in which [`TriggerCause`] they answer to.
//!
//! ```text
//!   IDLE ──(matching cause, first time)──► FIRED ──► emit() ──► broadcast
//!    │                                       │
//!    └──(other cause)──► IDLE                └──(any cause)──► FIRED (no-op)
//! ```

use crate::message::{DisseminationMessage, EventType};
use crate::telemetry::{names, ScalarRecord};
use denm_env::{BroadcastTransport, Position, SimTime, StationId, TrafficClass};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Trigger vocabulary understood by originators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCause {
    /// The vehicle itself crashed
    CrashIncident,
    
    /// The vehicle reports an accident it observed
    WitnessReport,
}

impl TriggerCause {
    /// Returns the cause string used by the storyboard.
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerCause::CrashIncident => "crash_incident",
            TriggerCause::WitnessReport => "witness_report",
        }
    }
    
    /// Parses a storyboard cause; unrecognized causes yield `None`.
    pub fn parse(cause: &str) -> Option<Self> {
        match cause {
            "crash_incident" => Some(TriggerCause::CrashIncident),
            "witness_report" => Some(TriggerCause::WitnessReport),
            _ => None,
        }
    }
    
    /// Event type stamped on messages emitted for this cause.
    pub fn event_type(&self) -> EventType {
        match self {
            TriggerCause::CrashIncident => EventType::Crash,
            TriggerCause::WitnessReport => EventType::Witness,
        }
    }
}

impl std::fmt::Display for TriggerCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Originator state for one agent.
#[derive(Debug, Clone)]
pub struct Originator {
    /// Emitting station
    station_id: StationId,
    
    /// The only cause this originator reacts to
    trigger: TriggerCause,
    
    /// Time of the first matching trigger; `Some` once fired
    event_time: Option<SimTime>,
    
    /// Last sequence number handed out (0 = none yet)
    sequence_counter: u32,
    
    scalars: ScalarRecord,
    
    finished: bool,
}

impl Originator {
    pub fn new(station_id: StationId, trigger: TriggerCause) -> Self {
        Self {
            station_id,
            trigger,
            event_time: None,
            sequence_counter: 0,
            scalars: ScalarRecord::new(),
            finished: false,
        }
    }
    
    /// Handles a storyboard trigger.
    ///
    /// Fires only on the configured cause and only once per run
    /// (first event wins). Returns `true` if this call fired.
    pub fn on_trigger<Net>(
        &mut self,
        cause: &str,
        now: SimTime,
        position: Position,
        network: &Net,
    ) -> bool
    where
        Net: BroadcastTransport<DisseminationMessage> + ?Sized,
    {
        if TriggerCause::parse(cause) != Some(self.trigger) {
            return false;
        }
        
        if self.has_fired() {
            debug!("{}: ignoring repeated {} at {}", self.station_id, cause, now);
            return false;
        }
        
        info!("{}: {} detected at {}, sending DENM", self.station_id, cause, now);
        self.event_time = Some(now);
        self.emit(now, position, network);
        true
    }
    
    /// Builds the next message and hands it to the transport.
    fn emit<Net>(&mut self, now: SimTime, position: Position, network: &Net)
    where
        Net: BroadcastTransport<DisseminationMessage> + ?Sized,
    {
        let Some(event_time) = self.event_time else {
            return;
        };
        
        self.sequence_counter += 1;
        let message = DisseminationMessage::new(
            self.station_id,
            self.sequence_counter,
            event_time,
            now,
            self.trigger.event_type(),
            position,
        );
        
        debug!(
            "Sending DENM: station={} seq={} event_time={} gen_time={}",
            self.station_id, self.sequence_counter, event_time, now
        );
        
        if let Err(e) = network.broadcast_single_hop(message, position, TrafficClass::Emergency) {
            warn!("{}: DENM broadcast lost: {}", self.station_id, e);
        }
        
        self.scalars.record_time(names::DENM_EVENT_TIME, event_time);
        self.scalars.record_time(names::DENM_SENT_TIME, now);
        self.scalars.record_duration(names::DENM_GENERATION_DELAY, now.duration_since(event_time));
        self.scalars.record(names::DENM_SEQUENCE_NUMBER, f64::from(self.sequence_counter));
    }
    
    /// End-of-run bookkeeping. Zero-fills the scalars of an agent that
    /// never fired.
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        
        if self.has_fired() {
            info!("{}: originator finished - sent {} DENMs", self.station_id, self.sequence_counter);
        } else {
            for name in [
                names::DENM_EVENT_TIME,
                names::DENM_SENT_TIME,
                names::DENM_GENERATION_DELAY,
                names::DENM_SEQUENCE_NUMBER,
            ] {
                self.scalars.record(name, 0.0);
            }
        }
    }
    
    pub fn has_fired(&self) -> bool {
        self.event_time.is_some()
    }
    
    pub fn event_time(&self) -> Option<SimTime> {
        self.event_time
    }
    
    pub fn trigger(&self) -> TriggerCause {
        self.trigger
    }
    
    pub fn sequence_counter(&self) -> u32 {
        self.sequence_counter
    }
    
    pub fn scalars(&self) -> &ScalarRecord {
        &self.scalars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CapturingTransport;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    
    fn crashed() -> (Originator, CapturingTransport) {
        let id = StationId::from_seed(1);
        (Originator::new(id, TriggerCause::CrashIncident), CapturingTransport::new(id))
    }
    
    #[test]
    fn test_matching_trigger_emits_one_message() {
        let (mut originator, net) = crashed();
        let pos = Position::new(40.0, 2.0);
        
        assert!(originator.on_trigger("crash_incident", SimTime::from_secs_f64(5.0), pos, &net));
        
        let sent = net.sent();
        assert_eq!(sent.len(), 1);
        
        let msg = &sent[0].message;
        assert_eq!(msg.station_id(), StationId::from_seed(1));
        assert_eq!(msg.sequence_number(), 1);
        assert_eq!(msg.event_time(), SimTime::from_secs_f64(5.0));
        assert_eq!(msg.generation_time(), SimTime::from_secs_f64(5.0));
        assert_eq!(msg.event_type(), EventType::Crash);
        assert_eq!(msg.position(), pos);
        assert!(!msg.is_relayed());
        assert_eq!(sent[0].class, TrafficClass::Emergency);
        assert_eq!(sent[0].sender_position, pos);
    }
    
    #[test]
    fn test_repeated_trigger_is_noop() {
        let (mut originator, net) = crashed();
        
        assert!(originator.on_trigger("crash_incident", SimTime::from_secs_f64(5.0), Position::zeros(), &net));
        assert!(!originator.on_trigger("crash_incident", SimTime::from_secs_f64(9.0), Position::zeros(), &net));
        
        assert_eq!(net.count(), 1);
        assert_eq!(originator.event_time(), Some(SimTime::from_secs_f64(5.0)));
        assert_eq!(originator.sequence_counter(), 1);
        assert_eq!(originator.scalars().count(names::DENM_SENT_TIME), 1);
    }
    
    #[test]
    fn test_other_causes_ignored() {
        let (mut originator, net) = crashed();
        
        assert!(!originator.on_trigger("witness_report", SimTime::from_secs_f64(1.0), Position::zeros(), &net));
        assert!(!originator.on_trigger("flat_tire", SimTime::from_secs_f64(2.0), Position::zeros(), &net));
        
        assert_eq!(net.count(), 0);
        assert!(!originator.has_fired());
    }
    
    #[test]
    fn test_witness_originator_uses_witness_type() {
        let id = StationId::from_seed(2);
        let net = CapturingTransport::new(id);
        let mut witness = Originator::new(id, TriggerCause::WitnessReport);
        
        assert!(!witness.on_trigger("crash_incident", SimTime::from_secs_f64(200.0), Position::zeros(), &net));
        assert!(witness.on_trigger("witness_report", SimTime::from_secs_f64(203.0), Position::zeros(), &net));
        
        let sent = net.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message.event_type(), EventType::Witness);
        assert_eq!(sent[0].message.event_time(), SimTime::from_secs_f64(203.0));
    }
    
    #[test]
    fn test_emission_telemetry() {
        let (mut originator, net) = crashed();
        originator.on_trigger("crash_incident", SimTime::from_secs_f64(200.0), Position::zeros(), &net);
        originator.finish();
        
        let scalars = originator.scalars();
        assert_relative_eq!(scalars.get(names::DENM_EVENT_TIME).unwrap(), 200.0);
        assert_relative_eq!(scalars.get(names::DENM_SENT_TIME).unwrap(), 200.0);
        assert_relative_eq!(scalars.get(names::DENM_GENERATION_DELAY).unwrap(), 0.0);
        assert_relative_eq!(scalars.get(names::DENM_SEQUENCE_NUMBER).unwrap(), 1.0);
        assert_eq!(scalars.len(), 4);
    }
    
    #[test]
    fn test_unfired_originator_zero_fills() {
        let (mut originator, _net) = crashed();
        originator.finish();
        originator.finish();
        
        let scalars = originator.scalars();
        assert_eq!(scalars.len(), 4);
        assert_eq!(scalars.get(names::DENM_SEQUENCE_NUMBER), Some(0.0));
    }
    
    #[test]
    fn test_closed_transport_still_fires() {
        let id = StationId::from_seed(3);
        let net = CapturingTransport::closed(id);
        let mut originator = Originator::new(id, TriggerCause::CrashIncident);
        
        assert!(originator.on_trigger("crash_incident", SimTime::from_secs_f64(1.0), Position::zeros(), &net));
        assert!(originator.has_fired());
        assert_eq!(net.count(), 0);
    }
    
    #[test]
    fn test_cause_parsing() {
        assert_eq!(TriggerCause::parse("crash_incident"), Some(TriggerCause::CrashIncident));
        assert_eq!(TriggerCause::parse("witness_report"), Some(TriggerCause::WitnessReport));
        assert_eq!(TriggerCause::parse("Crash_Incident"), None);
        assert_eq!(TriggerCause::WitnessReport.to_string(), "witness_report");
    }
    
    proptest! {
        #[test]
        fn prop_first_trigger_wins(times in proptest::collection::vec(0u64..1_000_000_000_000, 1..20)) {
            let (mut originator, net) = crashed();
            
            for &t in &times {
                originator.on_trigger("crash_incident", SimTime::from_nanos(t), Position::zeros(), &net);
            }
            
            prop_assert_eq!(net.count(), 1);
            prop_assert_eq!(originator.event_time(), Some(SimTime::from_nanos(times[0])));
            prop_assert_eq!(net.sent()[0].message.sequence_number(), 1);
        }
    }
}
