//! Load driver
//!
//! Runs a configurable number of blocking workers against a shared pool, each
//! repeatedly taking a scoped reservation and holding it for a while. Used by
//! the `connpool` binary to smoke-test a pool against a real backend.

use crate::config::WorkloadConfig;
use crate::connection::Connection;
use crate::error::PoolError;
use crate::pool::{OwnerId, PoolStatsSnapshot, ResourcePool};
use anyhow::Result;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Outcome of a workload run
#[derive(Debug, Clone)]
pub struct WorkloadReport {
    /// Scoped checkouts that completed
    pub completed: usize,
    /// Scoped checkouts that failed to obtain a connection
    pub failed: usize,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
    /// Pool counters at the end of the run
    pub stats: PoolStatsSnapshot,
    /// Live connections at the end of the run
    pub live_connections: usize,
}

/// Shared progress counters
#[derive(Debug, Default)]
struct Progress {
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// Run the workload until every worker finishes or shutdown is signalled
pub async fn run_workload<C: Connection>(
    pool: Arc<ResourcePool<C>>,
    config: WorkloadConfig,
    mut shutdown_rx: broadcast::Receiver<bool>,
) -> Result<WorkloadReport> {
    info!(
        "Starting workload: {} workers x {} iterations, hold {}ms, pool capacity {}",
        config.workers,
        config.iterations,
        config.hold_ms,
        pool.capacity()
    );

    let start = Instant::now();
    let stop = Arc::new(AtomicBool::new(false));
    let progress = Arc::new(Progress::default());

    let mut handles = Vec::with_capacity(config.workers);
    for worker in 0..config.workers {
        let pool = pool.clone();
        let stop = stop.clone();
        let progress = progress.clone();
        let config = config.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            run_worker(worker, &pool, &config, &stop, &progress)
        }));
    }

    let wait_all = async move {
        for handle in handles {
            handle.await?;
        }
        Ok::<_, tokio::task::JoinError>(())
    };
    tokio::pin!(wait_all);

    tokio::select! {
        res = &mut wait_all => res?,
        Ok(_) = shutdown_rx.recv() => {
            info!("Shutdown requested, stopping workers");
            stop.store(true, Ordering::SeqCst);
            (&mut wait_all).await?;
        }
    }

    let report = WorkloadReport {
        completed: progress.completed.load(Ordering::SeqCst),
        failed: progress.failed.load(Ordering::SeqCst),
        elapsed: start.elapsed(),
        stats: pool.stats().snapshot(),
        live_connections: pool.size(),
    };
    pool.stats().log_health();
    info!(
        "Workload finished in {:.3}s: completed={}, failed={}, live connections={}",
        report.elapsed.as_secs_f64(),
        report.completed,
        report.failed,
        report.live_connections
    );

    Ok(report)
}

/// One worker: `iterations` scoped checkouts under its own owner id
fn run_worker<C: Connection>(
    worker: usize,
    pool: &ResourcePool<C>,
    config: &WorkloadConfig,
    stop: &AtomicBool,
    progress: &Progress,
) {
    let owner = OwnerId::new();
    let hold = Duration::from_millis(config.hold_ms);
    debug!("Worker {} running as {}", worker, owner);

    for _ in 0..config.iterations {
        if stop.load(Ordering::SeqCst) {
            break;
        }

        let result = pool.with_resource(owner, |_conn| {
            std::thread::sleep(hold);
            Ok::<_, PoolError>(())
        });

        match result {
            Ok(()) => {
                progress.completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                progress.failed.fetch_add(1, Ordering::Relaxed);
                warn!("Worker {} failed to obtain a connection: {}", worker, e);
            }
        }
    }
}
