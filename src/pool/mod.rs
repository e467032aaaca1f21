//! Connection pool module for Connpool
//!
//! This module provides the bounded resource pool, its fair wait queue and
//! the per-owner reservation bookkeeping.

mod guard;
mod owner;
mod queue;
mod resource_pool;
mod stats;

pub use guard::ReservationGuard;
pub use owner::OwnerId;
pub use queue::WaitQueue;
pub use resource_pool::ResourcePool;
pub use stats::{PoolStats, PoolStatsSnapshot};

use crate::config::PoolConfig;
use crate::connection::Connection;
use crate::error::ConnpoolError;
use std::sync::Arc;

/// Create a shareable pool with the given configuration
pub fn create_pool<C: Connection>(config: PoolConfig) -> Result<Arc<ResourcePool<C>>, ConnpoolError> {
    ResourcePool::new(config).map(Arc::new)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::ResourcePool;
    use crate::config::PoolConfig;
    use crate::connection::{Connection, ConnectionParams};
    use crate::error::ConnectionError;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    thread_local! {
        static FAIL_NEXT_OPEN: Cell<bool> = const { Cell::new(false) };
    }

    /// In-memory connection that records what the pool does to it
    #[derive(Debug)]
    pub(crate) struct MockConnection {
        params: ConnectionParams,
        resets: AtomicUsize,
        closed: AtomicBool,
        dead: AtomicBool,
        fail_reset: AtomicBool,
    }

    impl MockConnection {
        /// Make the next `open` on this thread fail
        pub(crate) fn fail_next_open() {
            FAIL_NEXT_OPEN.with(|flag| flag.set(true));
        }

        pub(crate) fn fail_next_reset(&self) {
            self.fail_reset.store(true, Ordering::SeqCst);
        }

        pub(crate) fn kill(&self) {
            self.dead.store(true, Ordering::SeqCst);
        }

        pub(crate) fn resets(&self) -> usize {
            self.resets.load(Ordering::SeqCst)
        }

        pub(crate) fn params(&self) -> &ConnectionParams {
            &self.params
        }
    }

    impl Connection for MockConnection {
        fn open(params: &ConnectionParams) -> Result<Self, ConnectionError> {
            if FAIL_NEXT_OPEN.with(|flag| flag.replace(false)) {
                return Err(ConnectionError::Backend("refused".to_string()));
            }
            Ok(MockConnection {
                params: params.clone(),
                resets: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                dead: AtomicBool::new(false),
                fail_reset: AtomicBool::new(false),
            })
        }

        fn reset(&self) -> Result<(), ConnectionError> {
            if self.fail_reset.swap(false, Ordering::SeqCst) {
                return Err(ConnectionError::Backend("reset failed".to_string()));
            }
            self.resets.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }

        fn is_finished(&self) -> bool {
            self.closed.load(Ordering::SeqCst) || self.dead.load(Ordering::SeqCst)
        }
    }

    pub(crate) fn mock_pool(capacity: usize, checkout_timeout: f64) -> ResourcePool<MockConnection> {
        let config = PoolConfig {
            capacity,
            checkout_timeout,
            connection: ConnectionParams::new().with("dbname", "test"),
            ..Default::default()
        };
        ResourcePool::new(config).unwrap()
    }
}
