//! Load driver configuration
//!
//! Settings for the bundled `connpool` binary that exercises a pool.

use serde::{Deserialize, Serialize};

/// Default number of concurrent workers
fn default_workers() -> usize {
    8
}

/// Default checkouts per worker
fn default_iterations() -> usize {
    100
}

/// Default time each checkout holds its connection, in milliseconds
fn default_hold_ms() -> u64 {
    10
}

/// Load driver configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct WorkloadConfig {
    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Scoped checkouts performed by each worker
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// How long each checkout holds its connection, in milliseconds
    #[serde(default = "default_hold_ms")]
    pub hold_ms: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        WorkloadConfig {
            workers: default_workers(),
            iterations: default_iterations(),
            hold_ms: default_hold_ms(),
        }
    }
}

impl WorkloadConfig {
    /// Validate the workload configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workload_config_default() {
        let config = WorkloadConfig::default();
        assert_eq!(config.workers, 8);
        assert_eq!(config.iterations, 100);
        assert_eq!(config.hold_ms, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_workload_config_zero_workers() {
        let config = WorkloadConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
