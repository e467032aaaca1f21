//! Error types for Connpool
//!
//! This module defines all custom error types used throughout the crate.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Main error type for Connpool operations
#[derive(Error, Debug)]
pub enum ConnpoolError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pool error
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
}

/// Errors reported by the resource pool
#[derive(Error, Debug)]
pub enum PoolError {
    /// No connection became available before the checkout timeout elapsed
    #[error(
        "could not obtain a connection within {:.3} seconds (waited {:.3} seconds)",
        .timeout.as_secs_f64(),
        .elapsed.as_secs_f64()
    )]
    Exhausted {
        /// Configured checkout timeout
        timeout: Duration,
        /// Time actually spent waiting
        elapsed: Duration,
    },

    /// A new connection was needed but auto-connect is disabled
    #[error("connection not established: auto-connect is disabled and no idle connection is available")]
    Misconfigured,

    /// Opening or resetting the underlying connection failed
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl PoolError {
    /// Whether retrying the same call later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, PoolError::Exhausted { .. })
    }
}

/// Errors raised by a [`Connection`](crate::connection::Connection) implementation
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// IO error on the underlying session
    #[error("Connection IO error: {0}")]
    Io(#[from] io::Error),

    /// Connection parameters are missing or malformed
    #[error("Invalid connection parameters: {0}")]
    InvalidParams(String),

    /// The connection has already been closed
    #[error("Connection is closed")]
    Closed,

    /// Backend-specific failure
    #[error("Backend error: {0}")]
    Backend(String),
}
