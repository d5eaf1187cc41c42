//! Channel writes.
//!
//! Creation forwards the JSON model untouched. Updates render the model as
//! channel XML and run the override protocol: first with `override=false`,
//! then once more with `override=true` only if the engine reports a conflict.

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::header::{ACCEPT, CONTENT_TYPE, COOKIE, USER_AGENT};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::Response;

use crate::error::GatewayResult;
use crate::http::alerts::ENGINE_CLIENT;
use crate::http::request::InboundBody;
use crate::http::response::{relay_json, relay_translated_xml};
use crate::http::server::{complete, AppState};
use crate::resilience::override_retry::{send_with_override, OVERRIDE_PARAM};
use crate::upstream::headers::{header_text, insert_header, X_REQUESTED_WITH};
use crate::upstream::{OutboundBody, UpstreamRequest};
use crate::xml::build_channel_xml;

/// User agent the engine's own administrator client sends.
pub const ENGINE_USER_AGENT: &str = "Jersey/2.22.1 (Mirth Server Connection)";

pub async fn create_channel(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    complete("channels_create", create(&state, uri.path(), &headers, body).await)
}

async fn create(
    state: &AppState,
    path: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> GatewayResult<Response> {
    let body = InboundBody::classify(headers, body);

    let mut wire = HeaderMap::new();
    insert_header(&mut wire, CONTENT_TYPE.as_str(), "application/json");
    insert_header(&mut wire, ACCEPT.as_str(), "application/json");
    insert_header(&mut wire, X_REQUESTED_WITH, state.client_id());
    copy_cookie(headers, &mut wire);

    let request = UpstreamRequest {
        method: Method::POST,
        url: state.upstream.url_for_path(path),
        headers: wire,
        body: body.into_outbound(),
    };
    let reply = state
        .upstream
        .send("channels_create", request)
        .await?;

    Ok(relay_json(reply))
}

pub async fn update_channel(
    State(state): State<AppState>,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    complete(
        "channels_update",
        update(&state, &id, query.as_deref(), &headers, body).await,
    )
}

async fn update(
    state: &AppState,
    id: &str,
    query: Option<&str>,
    headers: &HeaderMap,
    body: Bytes,
) -> GatewayResult<Response> {
    let channel = InboundBody::classify(headers, body).into_json();
    let xml = Bytes::from(build_channel_xml(&channel, state.model_version())?);
    let passthrough = passthrough_params(query);
    let wire = update_headers(headers);
    let upstream = &state.upstream;

    let reply = send_with_override(|attempt| {
        let mut params: Vec<(&str, &str)> = passthrough
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        params.push((OVERRIDE_PARAM, attempt.override_param()));
        let url = upstream.endpoint(&["api", "channels", id], params);
        let headers = wire.clone();
        let body = xml.clone();

        async move {
            let url = url?;
            tracing::debug!(channel_id = %id, ?attempt, url = %url, "Updating channel");
            upstream
                .send(
                    "channels_update",
                    UpstreamRequest {
                        method: Method::PUT,
                        url: url.into(),
                        headers,
                        body: OutboundBody::Bytes(body),
                    },
                )
                .await
        }
    })
    .await?;

    Ok(relay_translated_xml(reply))
}

/// Inbound query pairs in order, minus any `override` the caller sent.
pub fn passthrough_params(query: Option<&str>) -> Vec<(String, String)> {
    query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .filter(|(name, _)| name != OVERRIDE_PARAM)
                .collect()
        })
        .unwrap_or_default()
}

fn update_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut wire = HeaderMap::new();
    insert_header(&mut wire, CONTENT_TYPE.as_str(), "application/xml");
    insert_header(&mut wire, ACCEPT.as_str(), "application/json, text/plain");
    insert_header(&mut wire, X_REQUESTED_WITH, ENGINE_CLIENT);
    insert_header(&mut wire, USER_AGENT.as_str(), ENGINE_USER_AGENT);
    copy_cookie(inbound, &mut wire);
    wire
}

fn copy_cookie(inbound: &HeaderMap, wire: &mut HeaderMap) {
    if let Some(cookie) = header_text(inbound, COOKIE.as_str()) {
        insert_header(wire, COOKIE.as_str(), &cookie);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_override_param_is_replaced() {
        assert_eq!(
            passthrough_params(Some("override=true&startChannel=false&a=b%20c")),
            vec![
                ("startChannel".to_string(), "false".to_string()),
                ("a".to_string(), "b c".to_string()),
            ]
        );
        assert!(passthrough_params(None).is_empty());
    }

    #[test]
    fn test_update_headers() {
        let mut inbound = HeaderMap::new();
        inbound.insert(COOKIE, HeaderValue::from_static("JSESSIONID=abc"));
        inbound.insert(ACCEPT, HeaderValue::from_static("text/html"));

        let wire = update_headers(&inbound);
        assert_eq!(wire.get(CONTENT_TYPE).unwrap(), "application/xml");
        assert_eq!(wire.get(ACCEPT).unwrap(), "application/json, text/plain");
        assert_eq!(wire.get(USER_AGENT).unwrap(), ENGINE_USER_AGENT);
        assert_eq!(wire.get(COOKIE).unwrap(), "JSESSIONID=abc");
        assert_eq!(wire.get(X_REQUESTED_WITH).unwrap(), ENGINE_CLIENT);
    }
}
