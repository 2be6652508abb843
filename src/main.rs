//! World Monitor RPC gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                      GATEWAY                         │
//!   Client Request     │  ┌─────────┐   ┌─────────┐   ┌─────────┐   ┌───────┐ │
//!   ───────────────────┼─▶│  http   │──▶│ origin  │──▶│ api key │──▶│router │ │
//!                      │  │ server  │   │  check  │   │  guard  │   │       │ │
//!                      │  └─────────┘   └─────────┘   └─────────┘   └───┬───┘ │
//!                      │                                                 │     │
//!                      │                                                 ▼     │
//!   Client Response    │  ┌─────────┐                         ┌──────────────┐ │
//!   ◀──────────────────┼──│  CORS   │◀────────────────────────│   domain     │◀┼── Upstream
//!                      │  │  merge  │                         │   service    │ │
//!                      │  └─────────┘                         └──────────────┘ │
//!                      │                                                       │
//!                      │  Cross-cutting: config · observability · lifecycle    │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use world_monitor_gateway::{config, observability, HttpServer, Shutdown};

#[derive(Debug, Parser)]
#[command(name = "world-monitor-gateway", version, about = "World Monitor RPC gateway")]
struct Args {
    /// Path to the TOML config file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::default_config()?,
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    observability::logging::init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "world-monitor-gateway starting");
    tracing::info!(
        config_path = ?args.config,
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        api_keys = config.api_keys.keys.len(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse::<std::net::SocketAddr>()?;
        observability::metrics::init_metrics(addr)?;
    }

    let server = HttpServer::new(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    shutdown.trigger_on_signal();

    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
