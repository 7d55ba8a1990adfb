//! Provider rotation engine (v1)
//!
//! Runs the rotation engine as a standalone service: recovery scheduler,
//! Prometheus metrics and the admin API.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller ──resolve(category)──▶ ┌──────────────────────────────────────────┐
//!                                 │               ROTATION ENGINE             │
//!                                 │                                          │
//!                                 │  ┌──────────┐   ┌──────────┐   ┌───────┐ │
//!                                 │  │ fallback │──▶│ selector │──▶│health │ │
//!                                 │  │  chains  │   │ (sticky) │   │ avail │ │
//!                                 │  └──────────┘   └────┬─────┘   └───────┘ │
//!                                 │                      ▼                    │
//!                                 │               ┌────────────┐              │
//!                                 │               │  registry  │◀── recovery  │
//!                                 │               │  (groups)  │    scheduler │
//!                                 │               └────────────┘              │
//!                                 │                                          │
//!   caller ──mark_error/limit───▶ │  config · observability · admin · lifecycle
//!                                 └──────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use provider_rotation::admin::{serve_admin, AdminState};
use provider_rotation::config::{load_config, EngineConfig};
use provider_rotation::lifecycle::{wait_for_signal, Shutdown};
use provider_rotation::observability::{logging, metrics};
use provider_rotation::RotationEngine;

#[derive(Parser)]
#[command(name = "provider-rotation")]
#[command(about = "Endpoint rotation and fallback engine for third-party API providers", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the health snapshot as JSON and exit.
    #[arg(long)]
    print_status: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    logging::init_logging(&config.observability.log_level);

    tracing::info!("provider-rotation v{} starting", env!("CARGO_PKG_VERSION"));
    if cli.config.is_none() {
        tracing::warn!("No config file given, running with defaults and no endpoints");
    }

    // The engine publishes initial availability gauges on construction
    if config.observability.metrics_enabled && !cli.print_status {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (engine, scheduler) = RotationEngine::from_config(&config)?;
    let engine = Arc::new(engine);

    if cli.print_status {
        println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
        return Ok(());
    }

    let shutdown = Shutdown::new();
    let mut tasks = vec![scheduler.spawn(shutdown.subscribe())];

    if config.admin.enabled {
        let addr: SocketAddr = config.admin.bind_address.parse()?;
        let state = AdminState::new(engine.clone(), &config.admin.api_key);
        let rx = shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = serve_admin(state, addr, rx).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        }));
    }

    let report = engine.snapshot();
    tracing::info!(
        groups = report.services.len(),
        endpoints = engine.registry().endpoint_count(),
        categories = engine.chains().categories().count(),
        "Engine ready"
    );

    wait_for_signal().await;
    shutdown.drain(tasks, Duration::from_secs(10)).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
