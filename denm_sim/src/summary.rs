//! Run summary aggregated from the recorded scalars.
//!
//! Works purely off the `ScalarStore`, the same way offline analysis of a
//! results file would: per-role module suffixes plus the stable metric names.

use crate::recorder::ScalarStore;
use denm_core::names;
use serde::{Deserialize, Serialize};

/// Descriptive statistics over a set of delays (seconds).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DelayStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (0 for fewer than two samples)
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
}

impl DelayStats {
    /// Statistics over `values`. Empty input gives all zeros.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        
        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let std = if n > 1 {
            let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };
        
        Self {
            count: n,
            mean,
            median: quantile(&sorted, 0.5),
            std,
            min: sorted[0],
            max: sorted[n - 1],
            p95: quantile(&sorted, 0.95),
        }
    }
}

/// Linear-interpolated quantile of an already sorted, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Headline numbers of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisseminationSummary {
    /// DENMs emitted by all originators
    pub denms_sent: u64,
    
    /// Vehicles carrying a receiver
    pub receivers: usize,
    
    /// Receivers that got at least one DENM
    pub received: usize,
    
    /// received / receivers
    pub delivery_ratio: f64,
    
    /// Receivers whose first DENM met the deadline
    pub within_deadline: usize,
    
    /// within_deadline / receivers
    pub within_deadline_ratio: f64,
    
    /// Receivers recorded as out of coverage
    pub out_of_coverage: usize,
    
    /// First-reception delays of the receivers that got the DENM
    pub reception_delay: DelayStats,
    
    /// Relay nodes in the run
    pub relays: usize,
    
    /// Successful re-broadcasts summed over relays
    pub denms_relayed: u64,
    
    /// Cloud delivery latencies of the relays that heard the DENM
    pub cloud_latency: DelayStats,
}

impl DisseminationSummary {
    /// Aggregates the run-end scalars.
    pub fn from_scalars(store: &ScalarStore) -> Self {
        let denms_sent: u64 = store
            .values("originator", names::DENM_SEQUENCE_NUMBER)
            .map(|(_, v)| v.max(0.0) as u64)
            .sum();
        
        let flags: Vec<(&str, f64)> = store.values("receiver", names::DENM_RECEIVED_FLAG).collect();
        let receivers = flags.len();
        
        let delays: Vec<f64> = flags
            .iter()
            .filter(|(_, flag)| *flag > 0.5)
            .filter_map(|(module, _)| store.get(module, names::DENM_RECEPTION_DELAY))
            .collect();
        let received = flags.iter().filter(|(_, flag)| *flag > 0.5).count();
        
        let within_deadline = store
            .values("receiver", names::DENM_WITHIN_DEADLINE)
            .filter(|(_, v)| *v > 0.5)
            .count();
        let out_of_coverage = store
            .values("receiver", names::DENM_OUT_OF_COVERAGE)
            .filter(|(_, v)| *v > 0.5)
            .count();
        
        let relayed: Vec<f64> = store.values("relay", names::DENMS_RELAYED).map(|(_, v)| v).collect();
        
        // Relays that heard nothing carry zero placeholders
        let cloud: Vec<f64> = store
            .values("relay", names::CLOUD_RECEIVED_FLAG)
            .filter(|(_, flag)| *flag > 0.5)
            .filter_map(|(module, _)| store.get(module, names::CLOUD_DELIVERY_LATENCY))
            .collect();
        
        Self {
            denms_sent,
            receivers,
            received,
            delivery_ratio: ratio(received, receivers),
            within_deadline,
            within_deadline_ratio: ratio(within_deadline, receivers),
            out_of_coverage,
            reception_delay: DelayStats::from_values(&delays),
            relays: relayed.len(),
            denms_relayed: relayed.iter().map(|v| v.max(0.0) as u64).sum(),
            cloud_latency: DelayStats::from_values(&cloud),
        }
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
