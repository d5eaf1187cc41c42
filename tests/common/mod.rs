//! Shared utilities for integration testing.

use std::net::SocketAddr;

use mirth_gateway::config::GatewayConfig;
use mirth_gateway::http::HttpServer;
use mirth_gateway::lifecycle::Shutdown;
use tokio::net::TcpListener;

/// A gateway running on an ephemeral port. Stops when dropped.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config pointing the gateway at a mock engine.
pub fn engine_config(engine_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.base_url = engine_url.to_string();
    config
}

/// Start a gateway in front of `engine_url` with default settings.
pub async fn spawn_gateway(engine_url: &str) -> TestGateway {
    spawn_gateway_with(engine_config(engine_url)).await
}

/// Start a gateway with a custom config.
pub async fn spawn_gateway_with(config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    TestGateway {
        addr,
        client,
        shutdown,
    }
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn closed_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
