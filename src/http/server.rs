//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every gateway route
//! - Wire up middleware (CORS, request ID, tracing, body limit)
//! - Bind the router to a listener and serve until shutdown
//!
//! # Routes
//! ```text
//! /api/form/{*rest}   any     → form.rs      (multipart rebuild)
//! /api/alerts         POST    → alerts.rs    (JSON → alert XML)
//! /api/channels       POST    → channels.rs  (JSON create)
//! /api/channels/{id}  PUT     → channels.rs  (JSON → channel XML, override retry)
//! /api/...            other   → forward.rs   (generic relay)
//! ```

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::error::GatewayResult;
use crate::http::{alerts, channels, cors, form, forward};
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::upstream::UpstreamClient;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub upstream: UpstreamClient,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let upstream = UpstreamClient::new(&config.upstream)?;
        Ok(Self {
            config: Arc::new(config),
            upstream,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.config.upstream.client_id
    }

    pub fn model_version(&self) -> &str {
        &self.config.upstream.model_version
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let state = AppState::new(config)?;
        let config = state.config.clone();
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/api/form/{*rest}", any(form::form_handler))
            .route(
                "/api/alerts",
                post(alerts::create_alert).fallback(forward::forward_handler),
            )
            .route(
                "/api/channels",
                post(channels::create_channel).fallback(forward::forward_handler),
            )
            .route(
                "/api/channels/{id}",
                put(channels::update_channel).fallback(forward::forward_handler),
            )
            .fallback(forward::api_fallback)
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.listener.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(cors::cors_layer()),
            )
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Turn a handler outcome into a response and count it.
pub(crate) fn complete(route: &'static str, outcome: GatewayResult<Response>) -> Response {
    let response = outcome.unwrap_or_else(IntoResponse::into_response);
    metrics::record_request(route, response.status().as_u16());
    response
}
