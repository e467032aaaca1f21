//! Test utilities and mocks for Connpool
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use connpool::{Connection, ConnectionError, ConnectionParams, PoolConfig, ResourcePool};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Connections opened by `MockConnection::open` across the test binary
pub static OPENED: AtomicUsize = AtomicUsize::new(0);

/// In-memory connection with an in-use marker for exclusivity checks
#[derive(Debug)]
pub struct MockConnection {
    /// Unique id assigned at open
    pub id: usize,
    in_use: AtomicBool,
    closed: AtomicBool,
    dead: AtomicBool,
    resets: AtomicUsize,
    closes: AtomicUsize,
}

impl MockConnection {
    /// Mark the connection as in use; returns false if it already was
    pub fn enter(&self) -> bool {
        !self.in_use.swap(true, Ordering::SeqCst)
    }

    /// Clear the in-use marker
    pub fn leave(&self) {
        self.in_use.store(false, Ordering::SeqCst);
    }

    /// Number of resets performed by the pool
    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    /// Number of times the pool closed this connection
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Simulate the backend dropping the session
    pub fn kill(&self) {
        self.dead.store(true, Ordering::SeqCst);
    }
}

impl Connection for MockConnection {
    fn open(_params: &ConnectionParams) -> Result<Self, ConnectionError> {
        Ok(MockConnection {
            id: OPENED.fetch_add(1, Ordering::SeqCst),
            in_use: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            dead: AtomicBool::new(false),
            resets: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        })
    }

    fn reset(&self) -> Result<(), ConnectionError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ConnectionError::Closed);
        }
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn is_finished(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.dead.load(Ordering::SeqCst)
    }
}

/// Create a shareable mock pool
pub fn create_mock_pool(capacity: usize, checkout_timeout: f64) -> Arc<ResourcePool<MockConnection>> {
    let config = PoolConfig {
        capacity,
        checkout_timeout,
        ..Default::default()
    };
    Arc::new(ResourcePool::new(config).unwrap())
}

/// Spin until `cond` holds, failing the test after `limit`
pub fn wait_until<F: Fn() -> bool>(cond: F, limit: Duration) {
    let start = std::time::Instant::now();
    while !cond() {
        assert!(start.elapsed() < limit, "condition not reached within {:?}", limit);
        thread::sleep(Duration::from_millis(1));
    }
}
