//! Multipart forwarding for `/api/form/*`.
//!
//! The header directive must carry a `multipart` spec; the JSON body is
//! split into named parts and sent to the same path without `/form`.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{ACCEPT, COOKIE};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::Response;

use crate::error::{GatewayError, GatewayResult};
use crate::http::forward::path_and_query;
use crate::http::request::InboundBody;
use crate::http::response::relay;
use crate::http::server::{complete, AppState};
use crate::upstream::headers::{insert_header, X_REQUESTED_WITH};
use crate::upstream::multipart::build_form;
use crate::upstream::{HeaderSpec, OutboundBody, UpstreamRequest};

const ROUTE: &str = "form";

/// Accept header sent with every multipart request.
pub const MULTIPART_ACCEPT: &str = "application/xml, application/json";

const FORM_SEGMENT: &str = "/form/";

pub async fn form_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = strip_form_segment(path_and_query(&uri));
    complete(ROUTE, forward_form(&state, method, &path, &headers, body).await)
}

async fn forward_form(
    state: &AppState,
    method: Method,
    path: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> GatewayResult<Response> {
    let spec = HeaderSpec::from_request(headers, state.client_id());
    let multipart = spec
        .multipart
        .as_ref()
        .filter(|m| !m.is_empty())
        .ok_or(GatewayError::InvalidMultipart)?;

    let body = InboundBody::classify(headers, body).into_json();
    let parts = multipart.plan(&body)?;
    tracing::debug!(
        %method,
        path,
        parts = ?parts.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        "Forwarding multipart request"
    );

    let request = UpstreamRequest {
        method,
        url: state.upstream.url_for_path(path),
        headers: multipart_headers(&spec, state.client_id()),
        body: OutboundBody::Form(build_form(parts)?),
    };
    let reply = state.upstream.send(ROUTE, request).await?;

    Ok(relay(reply, state.config.relay.attach_upstream_headers))
}

/// Accept, Cookie and X-Requested-With; the form sets its own Content-Type.
fn multipart_headers(spec: &HeaderSpec, client_id: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    insert_header(&mut map, ACCEPT.as_str(), MULTIPART_ACCEPT);
    if let Some(cookie) = spec.cookie.as_deref() {
        insert_header(&mut map, COOKIE.as_str(), cookie);
    }
    insert_header(
        &mut map,
        X_REQUESTED_WITH,
        spec.requested_with.as_deref().unwrap_or(client_id),
    );
    map
}

/// `/api/form/x` → `/api/x`.
pub fn strip_form_segment(path: &str) -> String {
    path.replacen(FORM_SEGMENT, "/", 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::MultipartSpec;

    #[test]
    fn test_strip_form_segment() {
        assert_eq!(
            strip_form_segment("/api/form/server/configurationMap"),
            "/api/server/configurationMap"
        );
        assert_eq!(
            strip_form_segment("/api/form/extensions/x?override=true"),
            "/api/extensions/x?override=true"
        );
    }

    #[test]
    fn test_multipart_headers() {
        let spec = HeaderSpec {
            cookie: Some("JSESSIONID=abc".to_string()),
            multipart: Some(MultipartSpec::parse("a;a.json")),
            ..HeaderSpec::default()
        };
        let map = multipart_headers(&spec, "OpenAPI");
        assert_eq!(map.get("accept").unwrap(), MULTIPART_ACCEPT);
        assert_eq!(map.get("cookie").unwrap(), "JSESSIONID=abc");
        assert_eq!(map.get("x-requested-with").unwrap(), "OpenAPI");
        assert!(map.get("content-type").is_none());
        assert!(map.get("multipart").is_none());
    }
}
