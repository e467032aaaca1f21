//! Connpool - load driver for the connection pool
//!
//! This is the main entry point for the Connpool application.

use anyhow::{Context, Result};
use clap::Parser;
use connpool::config::load_config;
use connpool::connection::TcpConnection;
use connpool::pool::create_pool;
use connpool::workload::run_workload;
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Connpool - exercise a bounded connection pool against a backend
#[derive(Parser, Debug)]
#[command(name = "connpool")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_log: bool,

    /// Override the number of workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Override the checkouts per worker
    #[arg(short, long)]
    iterations: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(&args.log_level, args.json_log)?;

    // Load configuration
    let mut config = load_config(&args.config)?;
    if let Some(workers) = args.workers {
        config.workload.workers = workers;
    }
    if let Some(iterations) = args.iterations {
        config.workload.iterations = iterations;
    }
    config.validate()?;

    info!("Connpool v{}", connpool::VERSION);
    info!("Configuration loaded from: {:?}", args.config);
    info!(
        "Pool capacity: {}, checkout timeout: {}s",
        config.pool.capacity, config.pool.checkout_timeout
    );

    let pool = create_pool::<TcpConnection>(config.pool.clone())
        .context("Failed to create connection pool")?;

    // Setup shutdown signal
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    // Handle Ctrl+C and termination signals (cross-platform)
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    tracing::warn!("Failed to setup SIGTERM handler: {}", e);
                    let _ = tokio::signal::ctrl_c().await;
                    let _ = shutdown_tx_clone.send(true);
                    return;
                }
            };

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            // On Windows, only handle Ctrl+C
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down...");
        }

        let _ = shutdown_tx_clone.send(true);
    });

    // Run the workload
    let report = run_workload(pool.clone(), config.workload, shutdown_rx).await;
    pool.disconnect_all();
    let report = report?;

    println!(
        "completed={} failed={} elapsed={:.3}s created={} timed_out={}",
        report.completed,
        report.failed,
        report.elapsed.as_secs_f64(),
        report.stats.total_created,
        report.stats.total_timed_out
    );

    Ok(())
}

/// Setup logging based on configuration
fn setup_logging(level: &str, json: bool) -> Result<()> {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
