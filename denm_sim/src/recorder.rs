//! Scalar store - the run-end recording sink.

use denm_env::TelemetrySink;
use serde::{Deserialize, Serialize};

/// One recorded scalar, addressed the way the analysis tooling expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarRow {
    /// Full module path, e.g. `node[3].receiver`
    pub module: String,
    pub name: String,
    pub value: f64,
}

/// Append-only table of every scalar flushed at run end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalarStore {
    rows: Vec<ScalarRow>,
}

impl ScalarStore {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Latest value of `name` in `module`.
    pub fn get(&self, module: &str, name: &str) -> Option<f64> {
        self.rows
            .iter()
            .rev()
            .find(|r| r.module == module && r.name == name)
            .map(|r| r.value)
    }
    
    /// Every row whose module ends with `.suffix` and carries `name`.
    pub fn values<'a>(&'a self, suffix: &'a str, name: &'a str) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        self.rows
            .iter()
            .filter(move |r| r.name == name && r.module.rsplit('.').next() == Some(suffix))
            .map(|r| (r.module.as_str(), r.value))
    }
    
    /// Distinct module paths in recording order.
    pub fn modules(&self) -> Vec<&str> {
        let mut modules: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !modules.contains(&row.module.as_str()) {
                modules.push(&row.module);
            }
        }
        modules
    }
    
    pub fn rows(&self) -> &[ScalarRow] {
        &self.rows
    }
    
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl TelemetrySink for ScalarStore {
    fn record_scalar(&mut self, module: &str, name: &str, value: f64) {
        self.rows.push(ScalarRow {
            module: module.to_string(),
            name: name.to_string(),
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_get_returns_latest() {
        let mut store = ScalarStore::new();
        store.record_scalar("node[0].receiver", "denm_received_flag", 0.0);
        store.record_scalar("node[0].receiver", "denm_received_flag", 1.0);
        
        assert_eq!(store.get("node[0].receiver", "denm_received_flag"), Some(1.0));
        assert_eq!(store.get("node[1].receiver", "denm_received_flag"), None);
    }
    
    #[test]
    fn test_values_by_role_suffix() {
        let mut store = ScalarStore::new();
        store.record_scalar("node[0].receiver", "denm_reception_delay", 0.2);
        store.record_scalar("node[1].receiver", "denm_reception_delay", 0.3);
        store.record_scalar("antenna[0].relay", "denm_reception_delay", 9.0);
        
        let delays: Vec<f64> = store.values("receiver", "denm_reception_delay").map(|(_, v)| v).collect();
        assert_eq!(delays, vec![0.2, 0.3]);
        assert_eq!(store.modules(), vec!["node[0].receiver", "node[1].receiver", "antenna[0].relay"]);
    }
}
