//! Forward-auth gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                  FORWARD-AUTH GATEWAY                 │
//!   Client        │  ┌─────────┐   ┌─────────┐   ┌──────────────┐        │
//!   ──────────────┼─▶│  http   │──▶│ routing │──▶│ forward_auth │────────┼──▶ Authorization
//!                 │  │ server  │   │         │   │    gate      │◀───────┼─── service
//!                 │  └─────────┘   └─────────┘   └──────┬───────┘        │
//!                 │                        allow │      │ deny           │
//!                 │                              ▼      ▼                │
//!   ◀─────────────┼──────────────────── upstream    auth response ─────  │
//!                 │                     (protected     (verbatim)        │
//!                 │                      resource)                       │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use forward_auth::config::loader::load_config;
use forward_auth::http::HttpServer;
use forward_auth::lifecycle::{signals, Shutdown};
use forward_auth::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "forward-auth")]
#[command(about = "Gateway that authorizes every request against an external service", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "forward-auth.toml")]
    config: PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    if cli.check {
        println!("{}: configuration ok ({} routes)", cli.config.display(), config.routes.len());
        return Ok(());
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("forward-auth v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        path = %cli.config.display(),
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        request_timeout_secs = config.listener.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Gates are installed before the listener binds.
    let server = HttpServer::new(config.clone())?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let mut server_task = tokio::spawn(server.run(listener, server_shutdown));

    tokio::select! {
        _ = signals::wait_for_shutdown() => {
            shutdown.trigger();
            server_task.await??;
        }
        result = &mut server_task => result??,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
