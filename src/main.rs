//! CORS Gateway
//!
//! A small reverse proxy that fronts a browser-facing frontend and forwards
//! its API traffic to one fixed upstream.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                  CORS GATEWAY                     │
//!                       │                                                   │
//!     Client Request    │  ┌────────┐   ┌─────────┐   ┌───────────────┐    │
//!     ──────────────────┼─▶│  cors  │──▶│ routing │──▶│   upstream    │────┼──▶ Upstream
//!                       │  │ policy │   │  table  │   │   forwarder   │    │    API
//!                       │  └────────┘   └────┬────┘   └──────┬────────┘    │
//!                       │                    │               │             │
//!                       │              ┌─────▼─────┐   ┌─────▼────────┐    │
//!     Client Response   │              │  upload   │   │    error     │    │
//!     ◀─────────────────┼──────────────│   relay   │   │  translator  │    │
//!                       │              └───────────┘   └──────────────┘    │
//!                       │                                                   │
//!                       │  ┌────────────────────────────────────────────┐  │
//!                       │  │           Cross-Cutting Concerns            │  │
//!                       │  │  ┌────────┐ ┌────────┐ ┌───────────────┐   │  │
//!                       │  │  │ config │ │ health │ │ observability │   │  │
//!                       │  │  └────────┘ └────────┘ └───────────────┘   │  │
//!                       │  └────────────────────────────────────────────┘  │
//!                       └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cors_gateway::config::loader;
use cors_gateway::http::HttpServer;
use cors_gateway::lifecycle::Shutdown;
use cors_gateway::observability::metrics;

#[derive(Parser)]
#[command(name = "cors-gateway")]
#[command(about = "CORS-enforcing reverse proxy for a single upstream API", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults plus PORT/UPSTREAM_URL
    /// environment overrides are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration once; nothing re-reads the environment per request.
    let config = match &cli.config {
        Some(path) => loader::load_config(path)?,
        None => loader::default_config()?,
    };

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "cors_gateway={},tower_http=debug",
                    config.observability.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("cors-gateway v0.1.0 starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        cors_mode = ?config.cors.mode,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    // Initialize metrics exporter
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    // Create and run HTTP server
    let shutdown = Shutdown::new();
    shutdown.listen_for_ctrl_c();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
