//! HTTP client for the upstream engine.
//!
//! # Responsibilities
//! - Hold the immutable engine base URL
//! - Build engine URLs from request paths or path segments
//! - Send one request and buffer the full reply
//!
//! # Design Decisions
//! - Non-2xx replies are returned as replies, never as errors
//! - No timeout unless configured; a hung engine stalls only its request
//! - Self-signed engine certificates are accepted when configured
//! - Redirects are never followed; a 3xx and its cookies go back to the browser

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use reqwest::multipart::Form;
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::observability::metrics;
use crate::upstream::reply::UpstreamReply;

/// Body of an outbound request.
#[derive(Debug)]
pub enum OutboundBody {
    Empty,
    Bytes(Bytes),
    Form(Form),
}

/// A fully described request to the engine.
#[derive(Debug)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: OutboundBody,
}

/// Client for the engine REST API.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: Arc<str>,
}

impl UpstreamClient {
    /// Create a client for the configured engine.
    pub fn new(config: &UpstreamConfig) -> GatewayResult<Self> {
        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::none());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
        })
    }

    /// Engine URL for an inbound path (and query), taken verbatim.
    pub fn url_for_path(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    /// Engine URL built from percent-encoded path segments and query pairs.
    pub fn endpoint<'a>(
        &self,
        segments: &[&str],
        query: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> GatewayResult<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::UpstreamUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);

        let mut pairs = query.into_iter().peekable();
        if pairs.peek().is_some() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    /// Send a request and buffer the reply.
    ///
    /// `route` labels the upstream latency metric.
    pub async fn send(&self, route: &'static str, request: UpstreamRequest) -> GatewayResult<UpstreamReply> {
        let start = Instant::now();
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.as_str())
            .headers(request.headers);

        builder = match request.body {
            OutboundBody::Empty => builder,
            OutboundBody::Bytes(bytes) => builder.body(bytes),
            OutboundBody::Form(form) => builder.multipart(form),
        };

        let result = async {
            let response = builder.send().await?;
            UpstreamReply::read(response).await
        }
        .await;
        metrics::record_upstream_latency(route, start);

        match &result {
            Ok(reply) => tracing::debug!(
                method = %request.method,
                url = %request.url,
                status = %reply.status,
                "Upstream replied"
            ),
            Err(e) => tracing::warn!(
                method = %request.method,
                url = %request.url,
                error = %e,
                "Upstream request failed"
            ),
        }

        result.map_err(GatewayError::from)
    }
}
