//! Run context trait for DENM stations.

use crate::types::SimTime;
use rand_chacha::ChaCha8Rng;

/// The central interface for run-scoped environment state.
///
/// # Implementations
///
/// - **Simulation**: `denm_sim::SimContext` - virtual clock, `ChaCha8Rng(seed)`
///
/// # Determinism
///
/// Every random stream a component uses is derived from the run seed, so a
/// run is reproducible from its seed alone.
pub trait DisseminationContext: Send + Sync + 'static {
    /// Returns the current simulated time.
    fn now(&self) -> SimTime;
    
    /// Derives an independent, reproducible RNG stream.
    ///
    /// The implementation combines the run seed with `stream` so that each
    /// relay node draws from its own sequence and adding nodes does not
    /// perturb the draws of existing ones.
    fn derive_rng(&self, stream: u64) -> ChaCha8Rng;
    
    /// Returns the run seed (for logging/debugging).
    fn seed(&self) -> u64;
}
