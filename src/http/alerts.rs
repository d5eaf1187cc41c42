//! Alert creation: JSON alert model in, alert XML PUT to the engine.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{ACCEPT, CONTENT_TYPE, COOKIE};
use axum::http::{HeaderMap, Method};
use axum::response::Response;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::GatewayResult;
use crate::http::request::InboundBody;
use crate::http::response::relay_verbatim;
use crate::http::server::{complete, AppState};
use crate::upstream::headers::{header_text, insert_header, X_REQUESTED_WITH};
use crate::upstream::{OutboundBody, UpstreamRequest};
use crate::xml::alert::text;
use crate::xml::build_alert_xml;

const ROUTE: &str = "alerts";

/// Client identifier the engine expects on XML writes.
pub const ENGINE_CLIENT: &str = "nextgen-connect-client";

pub async fn create_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    complete(ROUTE, create(&state, &headers, body).await)
}

async fn create(state: &AppState, headers: &HeaderMap, body: Bytes) -> GatewayResult<Response> {
    let mut alert = match InboundBody::classify(headers, body).into_json() {
        Value::Object(object) => object,
        _ => Map::new(),
    };
    let id = alert_id(&alert);
    alert.insert("id".to_string(), Value::String(id.clone()));

    let version = state.model_version();
    let xml = build_alert_xml(&Value::Object(alert), version)?;
    let url = state
        .upstream
        .endpoint(&["api", version, "alerts", &id], std::iter::empty())?;
    tracing::debug!(alert_id = %id, url = %url, "Creating alert");

    let mut wire = HeaderMap::new();
    insert_header(&mut wire, CONTENT_TYPE.as_str(), "application/xml");
    insert_header(&mut wire, ACCEPT.as_str(), "application/xml, application/json");
    insert_header(&mut wire, X_REQUESTED_WITH, ENGINE_CLIENT);
    if let Some(cookie) = header_text(headers, COOKIE.as_str()) {
        insert_header(&mut wire, COOKIE.as_str(), &cookie);
    }

    let request = UpstreamRequest {
        method: Method::PUT,
        url: url.into(),
        headers: wire,
        body: OutboundBody::Bytes(Bytes::from(xml)),
    };
    let reply = state.upstream.send(ROUTE, request).await?;

    Ok(relay_verbatim(reply))
}

/// The model's own id, or a fresh UUID when it has none.
fn alert_id(alert: &Map<String, Value>) -> String {
    let id = text(alert.get("id"));
    if id.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        id
    }
}
