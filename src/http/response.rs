//! Relaying engine replies back to the browser.
//!
//! # Responsibilities
//! - Carry every upstream `Set-Cookie` onto the client response
//! - Classify successful bodies (JSON object, null, array, other)
//! - Attach the upstream headers to JSON object bodies when configured
//! - Relay engine errors with their status and body intact
//!
//! # Design Decisions
//! - Bodies are fully buffered; the engine's payloads are small
//! - An empty error body becomes `{}` so the browser always has JSON to read

use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{Map, Value};

use crate::upstream::UpstreamReply;
use crate::xml::XmlElement;

/// Key under which upstream headers are attached to JSON object bodies.
pub const HEADERS_KEY: &str = "headers";

/// Generic relay used by the forwarding and form routes.
pub fn relay(reply: UpstreamReply, attach_headers: bool) -> Response {
    if !reply.is_success() {
        return relay_error(reply);
    }

    let response = match serde_json::from_slice::<Value>(&reply.body) {
        Ok(Value::Object(mut object)) => {
            if attach_headers {
                object.insert(HEADERS_KEY.to_string(), reply.headers_json());
            }
            Json(Value::Object(object)).into_response()
        }
        Ok(Value::Null) => {
            let mut object = Map::new();
            if attach_headers {
                object.insert(HEADERS_KEY.to_string(), reply.headers_json());
            }
            Json(Value::Object(object)).into_response()
        }
        Ok(Value::Array(_)) => raw(
            reply.body.clone(),
            Some(HeaderValue::from_static("application/json")),
        ),
        _ => raw(reply.body.clone(), reply.content_type().cloned()),
    };

    finish(response, &reply)
}

/// Status and body exactly as the engine sent them.
pub fn relay_verbatim(reply: UpstreamReply) -> Response {
    let response = raw(reply.body.clone(), reply.content_type().cloned());
    finish(response, &reply)
}

/// JSON relay: a JSON body is passed on, anything else becomes a JSON string.
pub fn relay_json(reply: UpstreamReply) -> Response {
    let value = serde_json::from_slice::<Value>(&reply.body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&reply.body).into_owned()));
    finish(Json(value).into_response(), &reply)
}

/// Relay an XML reply as its JSON view.
///
/// JSON bodies pass through; XML that does not parse is sent as a string.
pub fn relay_translated_xml(reply: UpstreamReply) -> Response {
    let value = translate_xml(&reply.body);
    finish(Json(value).into_response(), &reply)
}

fn translate_xml(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        return value;
    }

    let text = String::from_utf8_lossy(body);
    match XmlElement::parse(&text) {
        Ok(element) => element.to_json(),
        Err(e) => {
            tracing::warn!(error = %e, "Upstream XML could not be translated");
            Value::String(text.into_owned())
        }
    }
}

fn relay_error(reply: UpstreamReply) -> Response {
    let response = if reply.body.is_empty() {
        Json(Value::Object(Map::new())).into_response()
    } else {
        raw(reply.body.clone(), reply.content_type().cloned())
    };
    finish(response, &reply)
}

fn raw(body: Bytes, content_type: Option<HeaderValue>) -> Response {
    let mut response = Response::new(Body::from(body));
    if let Some(content_type) = content_type {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    response
}

/// Apply the upstream status and cookies.
fn finish(mut response: Response, reply: &UpstreamReply) -> Response {
    *response.status_mut() = reply.status;
    copy_set_cookies(&mut response, reply);
    response
}

/// Append every upstream `Set-Cookie` to `response`.
pub fn copy_set_cookies(response: &mut Response, reply: &UpstreamReply) {
    for cookie in reply.set_cookies() {
        response.headers_mut().append(SET_COOKIE, cookie.clone());
    }
}

/// Plain-text response, used for local rejections.
pub fn text(status: StatusCode, message: &'static str) -> Response {
    (status, message).into_response()
}
