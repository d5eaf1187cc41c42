//! Startup orchestration.
//!
//! # Order
//! 1. Metrics exporter (when enabled)
//! 2. Upstream client and router
//! 3. Listener bind, then serve until shutdown
//!
//! Fail fast: any startup error is fatal.

use std::error::Error;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::GatewayConfig;
use crate::http::HttpServer;
use crate::observability::metrics;

/// Start every subsystem and serve until `shutdown` fires.
///
/// The receiver is subscribed by the caller, so a signal that lands while
/// the listener is still binding is not lost.
pub async fn run(
    config: GatewayConfig,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), Box<dyn Error>> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    server.run(listener, shutdown).await?;
    Ok(())
}
