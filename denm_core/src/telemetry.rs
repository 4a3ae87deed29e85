//! Per-component scalar records and the stable metric vocabulary.
//!
//! Each component owns a `ScalarRecord` and appends to it as the protocol
//! runs. Nothing is shared; the harness drains every record into a
//! [`TelemetrySink`] once the run ends.

use denm_env::{SimTime, TelemetrySink};
use serde::Serialize;
use std::time::Duration;

/// Stable metric names. Presence is guaranteed per component at run end.
pub mod names {
    // Originator
    pub const DENM_EVENT_TIME: &str = "denm_event_time";
    pub const DENM_SENT_TIME: &str = "denm_sent_time";
    pub const DENM_GENERATION_DELAY: &str = "denm_generation_delay";
    pub const DENM_SEQUENCE_NUMBER: &str = "denm_sequence_number";
    
    // Relay
    pub const CLOUD_RECEIVED_FLAG: &str = "cloud_received_flag";
    pub const CLOUD_RECEPTION_TIME: &str = "cloud_reception_time";
    pub const CLOUD_EVENT_TIME: &str = "cloud_event_time";
    pub const CLOUD_DELIVERY_LATENCY: &str = "cloud_delivery_latency";
    pub const INFRA_COVERAGE_RADIUS: &str = "infra_coverage_radius";
    pub const INFRA_COVERAGE_RELIABILITY: &str = "infra_coverage_reliability";
    pub const DENMS_RELAYED: &str = "denms_relayed";
    
    // Receiver (also reports DENM_EVENT_TIME)
    pub const DENM_RECEIVED_FLAG: &str = "denm_received_flag";
    pub const DENM_RECEPTION_TIME: &str = "denm_reception_time";
    pub const DENM_RECEPTION_DELAY: &str = "denm_reception_delay";
    pub const DENM_WITHIN_DEADLINE: &str = "denm_within_deadline";
    pub const DENM_IN_COVERAGE: &str = "denm_in_coverage";
    pub const DENM_OUT_OF_COVERAGE: &str = "denm_out_of_coverage";
    pub const DENM_RELIABILITY_DROP: &str = "denm_reliability_drop";
    pub const DENMS_RECEIVED: &str = "denms_received";
}

/// One recorded scalar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scalar {
    pub name: &'static str,
    pub value: f64,
}

/// Append-only list of scalars emitted by one component instance.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScalarRecord {
    entries: Vec<Scalar>,
}

impl ScalarRecord {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Appends a raw value.
    pub fn record(&mut self, name: &'static str, value: f64) {
        self.entries.push(Scalar { name, value });
    }
    
    /// Appends a timestamp in seconds.
    pub fn record_time(&mut self, name: &'static str, time: SimTime) {
        self.record(name, time.as_secs_f64());
    }
    
    /// Appends a duration in seconds.
    pub fn record_duration(&mut self, name: &'static str, duration: Duration) {
        self.record(name, duration.as_secs_f64());
    }
    
    /// Appends a 0/1 flag.
    pub fn record_flag(&mut self, name: &'static str, flag: bool) {
        self.record(name, if flag { 1.0 } else { 0.0 });
    }
    
    /// Latest value recorded under `name`.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .rev()
            .find(|s| s.name == name)
            .map(|s| s.value)
    }
    
    /// How many times `name` was recorded.
    pub fn count(&self, name: &str) -> usize {
        self.entries.iter().filter(|s| s.name == name).count()
    }
    
    pub fn iter(&self) -> impl Iterator<Item = &Scalar> {
        self.entries.iter()
    }
    
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    
    /// Forwards every entry to `sink` under `module`.
    pub fn flush_to(&self, module: &str, sink: &mut dyn TelemetrySink) {
        for scalar in &self.entries {
            sink.record_scalar(module, scalar.name, scalar.value);
        }
    }
}
