//! linkwatch daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────── linkwatch ────────────────────────────┐
//!   │                                                                    │
//!   │  ┌──────────┐   tick   ┌──────────┐  Sample  ┌────────────────┐    │
//!   │  │ monitor  │────────▶│ sampler  │────────▶│  controller    │    │
//!   │  │  loop    │         └────┬─────┘         │ window+evaluator│    │
//!   │  └──────────┘              │ Ping/Pong     └───────┬────────┘    │
//!   │                            ▼                       │ ModeEvent   │
//!   │                     ┌────────────┐                 ▼             │
//!   │                     │  WsProbe   │◀── release ── notify ──▶ subscribers
//!   │                     └─────┬──────┘                               │
//!   │                           │                                      │
//!   │  ┌─────────┐ ┌───────────┐│┌────────────┐ ┌────────────┐         │
//!   │  │ config  │ │ lifecycle │││observability│ │   admin    │         │
//!   │  └─────────┘ └───────────┘│└────────────┘ └────────────┘         │
//!   └───────────────────────────┼──────────────────────────────────────┘
//!                               ▼
//!                  primary / healthcheck WebSocket endpoints
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use linkwatch::config::{load_config, MonitorConfig};
use linkwatch::health::{LinkMonitor, Mode};
use linkwatch::lifecycle::{signals, Shutdown};
use linkwatch::observability::{logging, metrics};
use linkwatch::probe::WsProbe;

#[derive(Parser)]
#[command(name = "linkwatch")]
#[command(about = "Monitor WebSocket link latency and switch to a healthcheck endpoint when it degrades", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override primary.url.
    #[arg(long)]
    primary_url: Option<String>,

    /// Override healthcheck.url.
    #[arg(long)]
    healthcheck_url: Option<String>,

    /// Override observability.log_level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => MonitorConfig::default(),
    };
    if let Some(url) = cli.primary_url {
        config.primary.url = url;
    }
    if let Some(url) = cli.healthcheck_url {
        config.healthcheck.url = url;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("linkwatch v{} starting", env!("CARGO_PKG_VERSION"));

    let probe = Arc::new(WsProbe::new(config.connection.clone()));
    let monitor = LinkMonitor::new(&config, probe)?;
    let handle = monitor.handle();

    tracing::info!(
        primary = %config.primary.url,
        healthcheck = %config.healthcheck.url,
        bad_threshold_ms = config.primary.bad_threshold_ms,
        good_threshold_ms = config.healthcheck.good_threshold_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    handle.on_change(|event| async move {
        match event.mode {
            Mode::Healthcheck => tracing::warn!(verdict = %event.verdict, "Link degraded, offline mode engaged"),
            Mode::Online => tracing::info!(verdict = %event.verdict, "Link recovered, online mode resumed"),
        }
    });

    let shutdown = Shutdown::new();

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        let admin_shutdown = shutdown.subscribe();
        let admin_handle = handle.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = linkwatch::admin::serve(listener, admin_handle, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        }))
    } else {
        None
    };

    signals::spawn_signal_handler(shutdown.clone());
    monitor.run(shutdown.subscribe()).await;

    if let Some(task) = admin_task {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Admin API task failed");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
