//! Mirth Gateway (v1)
//!
//! An API-translation gateway between the administrator web client and
//! the integration engine's REST API, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────┐
//!                        │                    GATEWAY                     │
//!                        │                                                │
//!     Browser request    │  ┌─────────┐    ┌───────────┐   ┌──────────┐  │
//!     ───────────────────┼─▶│  http   │───▶│ xml       │──▶│ upstream │──┼──▶ Engine
//!                        │  │ routes  │    │ templates │   │ client   │  │
//!                        │  └─────────┘    └───────────┘   └────┬─────┘  │
//!                        │       ▲                              │        │
//!     Browser response   │  ┌────┴─────┐   ┌────────────────┐   │        │
//!     ◀──────────────────┼──│ response │◀──│ override retry │◀──┘        │
//!                        │  │  relay   │   │  (channels)    │            │
//!                        │  └──────────┘   └────────────────┘            │
//!                        │                                                │
//!                        │  config · observability · lifecycle            │
//!                        └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use mirth_gateway::config::load_config;
use mirth_gateway::lifecycle::{signals, startup, Shutdown};
use mirth_gateway::observability::init_logging;

#[derive(Parser)]
#[command(name = "mirth-gateway")]
#[command(about = "API-translation gateway for the Mirth Connect REST API", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    init_logging(&config.observability);
    tracing::info!("mirth-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        model_version = %config.upstream.model_version,
        timeout_secs = ?config.upstream.timeout_secs,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    startup::run(config, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
