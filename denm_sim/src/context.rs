//! Simulation context implementing DisseminationContext for deterministic runs.

use denm_env::{DisseminationContext, SimTime};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Simulation context backed by a virtual clock and the run seed.
///
/// This implements `DisseminationContext` using:
/// - A virtual clock that only the event loop advances
/// - Seeded ChaCha8 streams, one per consumer
pub struct SimContext {
    /// Master seed for this run
    seed: u64,
    
    /// Current virtual time (nanoseconds since run start)
    virtual_time_ns: Arc<AtomicU64>,
}

impl SimContext {
    /// Creates a new SimContext with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            virtual_time_ns: Arc::new(AtomicU64::new(0)),
        }
    }
    
    /// Creates an Arc-wrapped context for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }
    
    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.virtual_time_ns.fetch_add(nanos, Ordering::SeqCst);
    }
    
    /// Moves the clock forward to `time`. Never moves it backwards.
    pub fn set_time(&self, time: SimTime) {
        self.virtual_time_ns.fetch_max(time.as_nanos(), Ordering::SeqCst);
    }
}

impl Clone for SimContext {
    fn clone(&self) -> Self {
        Self {
            seed: self.seed,
            virtual_time_ns: Arc::clone(&self.virtual_time_ns),
        }
    }
}

impl DisseminationContext for SimContext {
    fn now(&self) -> SimTime {
        SimTime::from_nanos(self.virtual_time_ns.load(Ordering::SeqCst))
    }
    
    fn derive_rng(&self, stream: u64) -> ChaCha8Rng {
        // Combine master seed with the stream id for an isolated sequence
        let combined_seed = self.seed
            .wrapping_mul(0x9e3779b97f4a7c15)
            .wrapping_add(stream.wrapping_mul(0x517cc1b727220a95));
        ChaCha8Rng::seed_from_u64(combined_seed)
    }
    
    fn seed(&self) -> u64 {
        self.seed
    }
}
