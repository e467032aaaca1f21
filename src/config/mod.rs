//! Configuration module for Connpool
//!
//! This module provides configuration types and parsing for the pool and the
//! bundled load driver.

mod pool;
mod workload;

pub use pool::PoolConfig;
pub use workload::WorkloadConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Connection pool configuration
    #[serde(default)]
    pub pool: PoolConfig,

    /// Load driver configuration
    #[serde(default)]
    pub workload: WorkloadConfig,
}

impl Config {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.pool
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid [pool] section")?;
        self.workload
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid [workload] section")?;
        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    parse_config(&content)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse configuration")?;
    config.validate()?;
    Ok(config)
}
