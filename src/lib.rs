//! # Connpool - Bounded Pool for Stateful Connections
//!
//! Connpool hands out exclusive access to a fixed-size set of expensive,
//! stateful connections (typically database sessions) shared by many
//! concurrent callers.
//!
//! ## Features
//!
//! - **Bounded**: never more live connections than the configured capacity
//! - **Fair**: a caller already waiting is never overtaken by a newcomer
//! - **Owner-aware**: repeated requests from one unit of work reuse one connection
//! - **Timeouts**: blocked callers give up after the checkout timeout
//! - **Scoped use**: `with_resource` and `scoped` release on every exit path
//!
//! ## Usage
//!
//! ```rust,ignore
//! use connpool::config::PoolConfig;
//! use connpool::connection::{ConnectionParams, TcpConnection};
//! use connpool::pool::{OwnerId, ResourcePool};
//!
//! let config = PoolConfig {
//!     capacity: 4,
//!     connection: ConnectionParams::new().with("host", "localhost").with("port", 5432),
//!     ..Default::default()
//! };
//! let pool = ResourcePool::<TcpConnection>::new(config)?;
//!
//! let owner = OwnerId::new();
//! pool.with_resource(owner, |conn| {
//!     // talk to the backend
//!     Ok::<_, connpool::PoolError>(())
//! })?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! acquire(owner) -> reservation cache hit? -> return it
//!                -> lock -> idle connection? -> reset, reserve, return
//!                        -> below capacity?  -> open, reset, reserve, return
//!                        -> wait on queue until released or timeout
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod connection;
pub mod error;
pub mod pool;
pub mod workload;

// Re-export commonly used items
pub use config::{load_config, Config, PoolConfig};
pub use connection::{Connection, ConnectionParams};
pub use error::{ConnectionError, ConnpoolError, PoolError};
pub use pool::{OwnerId, ResourcePool};

/// Version of the Connpool library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
