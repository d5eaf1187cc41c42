//! Generic relay for every `/api` request without a dedicated handler.
//!
//! The method and the path (with its query string) are kept as-is. Headers
//! come from the header directive or are derived from the request, and the
//! body only travels with POST, PUT and PATCH.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;

use crate::error::GatewayResult;
use crate::http::request::InboundBody;
use crate::http::response::{self, relay};
use crate::http::server::{complete, AppState};
use crate::upstream::{HeaderSpec, UpstreamRequest};

const ROUTE: &str = "forward";

/// Path prefix served by the gateway.
pub const API_PREFIX: &str = "/api/";

/// Session-affecting engine paths whose replies are logged.
const DIAGNOSTIC_PATHS: [&str; 2] = ["/_logout", "/preferences/"];

pub async fn forward_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = path_and_query(&uri);
    complete(ROUTE, forward(&state, method, path, &headers, body).await)
}

/// Router fallback: relay anything under `/api/`, 404 everything else.
pub async fn api_fallback(
    state: State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !uri.path().starts_with(API_PREFIX) {
        return response::text(StatusCode::NOT_FOUND, "Not Found");
    }
    forward_handler(state, method, uri, headers, body).await
}

/// Relay one request to the same path on the engine.
pub async fn forward(
    state: &AppState,
    method: Method,
    path: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> GatewayResult<Response> {
    let body = InboundBody::for_method(&method, headers, body);
    let spec = HeaderSpec::from_request(headers, state.client_id());
    let with_body = !body.is_empty();

    let diagnostic = DIAGNOSTIC_PATHS.iter().any(|p| path.contains(p));
    tracing::debug!(
        %method,
        path,
        headers = ?spec.header_names(with_body),
        body = body.kind(),
        "Forwarding request"
    );

    let request = UpstreamRequest {
        method,
        url: state.upstream.url_for_path(path),
        headers: spec.to_header_map(with_body),
        body: body.into_outbound(),
    };
    let reply = state.upstream.send(ROUTE, request).await?;

    if diagnostic {
        tracing::debug!(
            path,
            status = %reply.status,
            set_cookie = reply.set_cookies().next().is_some(),
            "Session-affecting call answered"
        );
    }

    Ok(relay(reply, state.config.relay.attach_upstream_headers))
}

/// Path plus query string, exactly as received.
pub fn path_and_query(uri: &Uri) -> &str {
    uri.path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_and_query_kept() {
        let uri: Uri = "/api/channels?include=a&include=b".parse().unwrap();
        assert_eq!(path_and_query(&uri), "/api/channels?include=a&include=b");

        let uri: Uri = "/api/server/status".parse().unwrap();
        assert_eq!(path_and_query(&uri), "/api/server/status");
    }
}
