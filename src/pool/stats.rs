//! Pool statistics
//!
//! Lock-free counters updated by the pool and read for diagnostics.

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Statistics for the resource pool
#[derive(Debug, Default)]
pub struct PoolStats {
    /// Total connections opened
    pub total_created: AtomicUsize,
    /// Total successful checkouts
    pub total_acquired: AtomicUsize,
    /// Total checkins
    pub total_released: AtomicUsize,
    /// Checkouts that gave up after the checkout timeout
    pub total_timed_out: AtomicUsize,
    /// Connections closed or dropped as stale
    pub total_closed: AtomicUsize,
}

impl PoolStats {
    /// Create new pool stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a connection being opened
    pub fn record_created(&self) {
        self.total_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful checkout
    pub fn record_acquired(&self) {
        self.total_acquired.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a checkin
    pub fn record_released(&self) {
        self.total_released.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a checkout timeout
    pub fn record_timed_out(&self) {
        self.total_timed_out.fetch_add(1, Ordering::Relaxed);
    }

    /// Record `count` connections leaving the pool for good
    pub fn record_closed(&self, count: usize) {
        self.total_closed.fetch_add(count, Ordering::Relaxed);
    }

    /// Get current stats snapshot
    pub fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            total_created: self.total_created.load(Ordering::Relaxed),
            total_acquired: self.total_acquired.load(Ordering::Relaxed),
            total_released: self.total_released.load(Ordering::Relaxed),
            total_timed_out: self.total_timed_out.load(Ordering::Relaxed),
            total_closed: self.total_closed.load(Ordering::Relaxed),
        }
    }

    /// Log a one-line summary at debug level
    pub fn log_health(&self) {
        let stats = self.snapshot();
        debug!(
            "Pool health: created={}, acquired={}, released={}, timed_out={}, closed={}",
            stats.total_created,
            stats.total_acquired,
            stats.total_released,
            stats.total_timed_out,
            stats.total_closed
        );
    }
}

/// Snapshot of pool statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub struct PoolStatsSnapshot {
    pub total_created: usize,
    pub total_acquired: usize,
    pub total_released: usize,
    pub total_timed_out: usize,
    pub total_closed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_stats_new() {
        let stats = PoolStats::new();
        assert_eq!(stats.snapshot(), PoolStatsSnapshot::default());
    }

    #[test]
    fn test_pool_stats_record_created() {
        let stats = PoolStats::new();
        stats.record_created();
        stats.record_created();

        assert_eq!(stats.snapshot().total_created, 2);
    }

    #[test]
    fn test_pool_stats_record_acquired_released() {
        let stats = PoolStats::new();

        stats.record_acquired();
        assert_eq!(stats.snapshot().total_acquired, 1);

        stats.record_released();
        assert_eq!(stats.snapshot().total_released, 1);
    }

    #[test]
    fn test_pool_stats_record_timed_out_and_closed() {
        let stats = PoolStats::new();
        stats.record_timed_out();
        stats.record_closed(3);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_timed_out, 1);
        assert_eq!(snapshot.total_closed, 3);
    }
}
