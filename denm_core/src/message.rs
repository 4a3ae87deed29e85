//! The dissemination message (DENM) and its identity.
//!
//! A `DisseminationMessage` is a value: it is built once by an originator
//! and never mutated. A relay that needs to stamp its identity produces a
//! fresh value through [`DisseminationMessage::relayed_by`].

use denm_env::{Position, SimTime, StationId};
use serde::{Deserialize, Serialize};

/// Label carried by a message that no infrastructure node has relayed yet.
pub const UNKNOWN_RELAY_ORIGIN: &str = "unknown";

/// Kind of hazard a DENM reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// The sender itself crashed
    Crash,
    
    /// The sender observed someone else's accident
    Witness,
}

impl EventType {
    /// Returns the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Crash => "CRASH",
            EventType::Witness => "WITNESS",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplication key: unique per originator for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId {
    pub station_id: StationId,
    pub sequence_number: u32,
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.station_id, self.sequence_number)
    }
}

/// A Decentralized Environmental Notification Message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisseminationMessage {
    /// Emitting agent (never changed by a relay)
    station_id: StationId,
    
    /// Per-originator counter, starting at 1
    sequence_number: u32,
    
    /// When the underlying hazard happened
    event_time: SimTime,
    
    /// When this message instance was produced
    generation_time: SimTime,
    
    event_type: EventType,
    
    /// Originator position at generation time
    position: Position,
    
    /// Infrastructure type of the last relay hop, `None` for a direct broadcast
    relay_origin: Option<String>,
}

impl DisseminationMessage {
    /// Creates a direct (not yet relayed) message.
    ///
    /// `generation_time` is clamped up to `event_time` so that
    /// `generation_time >= event_time` always holds.
    pub fn new(
        station_id: StationId,
        sequence_number: u32,
        event_time: SimTime,
        generation_time: SimTime,
        event_type: EventType,
        position: Position,
    ) -> Self {
        Self {
            station_id,
            sequence_number,
            event_time,
            generation_time: generation_time.max(event_time),
            event_type,
            position,
            relay_origin: None,
        }
    }
    
    /// Returns a copy tagged as relayed by `infrastructure_type`.
    ///
    /// The receiver is left untouched; other recipients holding it keep
    /// seeing the original tag.
    pub fn relayed_by(&self, infrastructure_type: &str) -> Self {
        Self {
            relay_origin: Some(infrastructure_type.to_string()),
            ..self.clone()
        }
    }
    
    /// Returns the deduplication key.
    pub fn id(&self) -> MessageId {
        MessageId {
            station_id: self.station_id,
            sequence_number: self.sequence_number,
        }
    }
    
    pub fn station_id(&self) -> StationId {
        self.station_id
    }
    
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }
    
    pub fn event_time(&self) -> SimTime {
        self.event_time
    }
    
    pub fn generation_time(&self) -> SimTime {
        self.generation_time
    }
    
    pub fn event_type(&self) -> EventType {
        self.event_type
    }
    
    pub fn position(&self) -> Position {
        self.position
    }
    
    /// Returns the relay tag, or `"unknown"` for a direct broadcast.
    pub fn relay_origin(&self) -> &str {
        self.relay_origin.as_deref().unwrap_or(UNKNOWN_RELAY_ORIGIN)
    }
    
    /// True once an infrastructure node has re-broadcast this message.
    pub fn is_relayed(&self) -> bool {
        self.relay_origin.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    fn sample() -> DisseminationMessage {
        DisseminationMessage::new(
            StationId::from_seed(1),
            1,
            SimTime::from_secs_f64(5.0),
            SimTime::from_secs_f64(5.0),
            EventType::Crash,
            Position::new(120.0, -4.5),
        )
    }
    
    #[test]
    fn test_direct_message_is_unknown_origin() {
        let msg = sample();
        assert_eq!(msg.relay_origin(), UNKNOWN_RELAY_ORIGIN);
        assert!(!msg.is_relayed());
    }
    
    #[test]
    fn test_relayed_by_leaves_original_untouched() {
        let original = sample();
        let relayed = original.relayed_by("satellite");
        
        assert_eq!(relayed.relay_origin(), "satellite");
        assert_eq!(original.relay_origin(), UNKNOWN_RELAY_ORIGIN);
        
        // Identity and timing survive the hop
        assert_eq!(relayed.id(), original.id());
        assert_eq!(relayed.event_time(), original.event_time());
        assert_eq!(relayed.generation_time(), original.generation_time());
        assert_eq!(relayed.position(), original.position());
    }
    
    #[test]
    fn test_generation_never_precedes_event() {
        let msg = DisseminationMessage::new(
            StationId::from_seed(1),
            1,
            SimTime::from_secs_f64(5.0),
            SimTime::from_secs_f64(4.0),
            EventType::Witness,
            Position::zeros(),
        );
        assert_eq!(msg.generation_time(), msg.event_time());
    }
    
    #[test]
    fn test_event_type_wire_names() {
        assert_eq!(EventType::Crash.to_string(), "CRASH");
        assert_eq!(EventType::Witness.as_str(), "WITNESS");
    }
}
