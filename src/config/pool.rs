//! Connection pool configuration
//!
//! Defines capacity, checkout timeout and connection-target settings.

use crate::connection::ConnectionParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default maximum number of connections
fn default_capacity() -> usize {
    5
}

/// Default checkout timeout in seconds
fn default_checkout_timeout() -> f64 {
    5.0
}

/// Default auto-connect setting
fn default_auto_connect() -> bool {
    true
}

/// Connection pool configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PoolConfig {
    /// Maximum number of connections that may exist at once
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Maximum time, in seconds, to wait for a connection
    #[serde(default = "default_checkout_timeout")]
    pub checkout_timeout: f64,

    /// Whether the pool may open connections on demand
    #[serde(default = "default_auto_connect")]
    pub auto_connect: bool,

    /// Connection-target parameters forwarded to the connection type
    #[serde(default)]
    pub connection: ConnectionParams,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            capacity: default_capacity(),
            checkout_timeout: default_checkout_timeout(),
            auto_connect: default_auto_connect(),
            connection: ConnectionParams::default(),
        }
    }
}

impl PoolConfig {
    /// Validate the pool configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".to_string());
        }
        self.checkout_timeout_duration()?;
        Ok(())
    }

    /// Checkout timeout as a `Duration`
    ///
    /// Fails for non-positive values and for values too large to represent.
    pub fn checkout_timeout_duration(&self) -> Result<Duration, String> {
        if !self.checkout_timeout.is_finite() || self.checkout_timeout <= 0.0 {
            return Err("checkout_timeout must be a positive number of seconds".to_string());
        }
        Duration::try_from_secs_f64(self.checkout_timeout)
            .map_err(|e| format!("checkout_timeout is out of range: {}", e))
    }
}
