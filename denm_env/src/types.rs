//! Common types for the DENM environment abstraction.

use serde::{Deserialize, Serialize};
use std::ops::Add;
use std::time::Duration;
use uuid::Uuid;

/// 2D position in meters (local planar frame).
pub type Position = nalgebra::Vector2<f64>;

/// Unique identifier for a station (vehicle or infrastructure node).
///
/// Uses UUID v4 for global uniqueness without coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StationId(pub Uuid);

impl StationId {
    /// Creates a new random StationId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
    
    /// Creates a StationId from a UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
    
    /// Creates a deterministic StationId from a seed (for simulation).
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
        Self(Uuid::from_bytes(bytes))
    }
    
    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for StationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show first 8 chars for readability
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Converts fractional seconds to a `Duration`, rounding to the nearest
/// nanosecond. Negative and NaN inputs map to zero.
///
/// Rounding (rather than truncating) keeps decimal inputs such as `0.2`
/// exactly comparable with differences of `SimTime::from_secs_f64` values.
pub fn secs_to_duration(secs: f64) -> Duration {
    Duration::from_nanos(round_nanos(secs))
}

fn round_nanos(secs: f64) -> u64 {
    let nanos = (secs.max(0.0) * 1e9).round();
    if nanos >= u64::MAX as f64 {
        u64::MAX
    } else {
        nanos as u64
    }
}

/// A point on the simulated timeline, in integer nanoseconds since run start.
///
/// Integer ticks make the inclusive deadline boundary exact: a delay
/// computed as `reception - event` compares equal to a configured deadline
/// of the same decimal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SimTime(u64);

impl SimTime {
    /// The start of the run.
    pub const ZERO: SimTime = SimTime(0);
    
    /// Creates a timestamp from nanoseconds since run start.
    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }
    
    /// Creates a timestamp from fractional seconds since run start.
    pub fn from_secs_f64(secs: f64) -> Self {
        Self(round_nanos(secs))
    }
    
    /// Returns nanoseconds since run start.
    pub fn as_nanos(&self) -> u64 {
        self.0
    }
    
    /// Returns fractional seconds since run start.
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1e9
    }
    
    /// Time elapsed since `earlier`, saturating at zero.
    pub fn duration_since(&self, earlier: SimTime) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;
    
    fn add(self, rhs: Duration) -> SimTime {
        let nanos = u64::try_from(rhs.as_nanos()).unwrap_or(u64::MAX);
        SimTime(self.0.saturating_add(nanos))
    }
}

impl From<Duration> for SimTime {
    fn from(d: Duration) -> Self {
        SimTime::ZERO + d
    }
}

impl std::fmt::Display for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}s", self.as_secs_f64())
    }
}

/// Traffic class requested for a broadcast (DCC profile).
///
/// DENMs always go out as `Emergency`; the other classes exist so that a
/// transport can order mixed traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrafficClass {
    /// Highest priority (DP2 emergency profile)
    Emergency,
    
    /// Periodic awareness traffic
    Standard,
    
    /// Best effort
    Background,
}
