//! JSON exporter for offline analysis.
//!
//! One document per run: what was run, the headline summary, and every
//! recorded scalar row.

use crate::error::SimError;
use crate::recorder::ScalarRow;
use crate::runner::ScenarioResult;
use crate::summary::DisseminationSummary;
use crate::world::{NetworkMetrics, SimConfig};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Complete simulation export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,
    
    /// Seed used
    pub seed: u64,
    
    /// Duration in seconds
    pub duration_sec: f64,
    
    /// Final results
    pub passed: bool,
    
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    
    /// Run configuration
    pub config: SimConfig,
    
    pub summary: DisseminationSummary,
    
    pub network: NetworkMetrics,
    
    /// All scalars, in recording order
    pub scalars: Vec<ScalarRow>,
}

impl SimExport {
    /// Builds the export for a finished run.
    pub fn from_result(result: &ScenarioResult, config: &SimConfig) -> Self {
        Self {
            scenario: result.scenario.name().to_string(),
            seed: result.seed,
            duration_sec: result.final_time_secs,
            passed: result.passed,
            failure_reason: result.failure_reason.clone(),
            config: config.clone(),
            summary: result.summary.clone(),
            network: result.metrics,
            scalars: result.scalars.rows().to_vec(),
        }
    }
    
    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ScenarioRunner;
    use crate::scenarios::ScenarioId;
    
    #[test]
    fn test_export_round_trip_through_file() {
        let runner = ScenarioRunner::new(42).with_vehicles(5);
        let result = runner.run(ScenarioId::CrashedTerrestrial).unwrap();
        let export = SimExport::from_result(&result, runner.config());
        
        assert_eq!(export.scenario, "crashed_terrestrial");
        assert_eq!(export.scalars.len(), result.scalars.len());
        
        let path = std::env::temp_dir().join(format!("denm_export_{}.json", std::process::id()));
        export.write_to_file(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        
        let parsed: SimExport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.seed, 42);
        assert_eq!(parsed.summary.received, export.summary.received);
        assert_eq!(parsed.scalars.len(), export.scalars.len());
        assert!(text.contains("\"denm_received_flag\""));
    }
}
