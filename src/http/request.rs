//! Inbound request body handling.
//!
//! # Responsibilities
//! - Decide whether a method carries a body at all
//! - Classify the body by Content-Type (JSON vs. raw pass-through)
//! - Normalize empty / unparseable JSON bodies to "no body"
//!
//! # Design Decisions
//! - Only JSON objects and arrays count as JSON bodies; a malformed or
//!   scalar JSON body is treated as absent rather than rejected
//! - Text, XML and any other media type pass through byte-for-byte

use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method};
use serde_json::Value;

use crate::upstream::OutboundBody;

/// Methods that forward a body upstream.
pub fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Whether the inbound Content-Type declares JSON.
pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|essence| {
            let essence = essence.trim().to_ascii_lowercase();
            essence == "application/json" || essence.ends_with("+json")
        })
        .unwrap_or(false)
}

/// A classified inbound body.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundBody {
    Empty,
    Json(Value),
    Raw(Bytes),
}

impl InboundBody {
    /// Classify raw body bytes using the inbound headers.
    pub fn classify(headers: &HeaderMap, bytes: Bytes) -> Self {
        if bytes.is_empty() {
            return InboundBody::Empty;
        }
        if !is_json(headers) {
            return InboundBody::Raw(bytes);
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => InboundBody::Json(value),
            Ok(_) => {
                tracing::debug!("Scalar JSON body, treating as empty");
                InboundBody::Empty
            }
            Err(e) => {
                tracing::debug!(error = %e, "JSON parsing error, treating as empty body");
                InboundBody::Empty
            }
        }
    }

    /// Classify only when `method` carries a body.
    pub fn for_method(method: &Method, headers: &HeaderMap, bytes: Bytes) -> Self {
        if carries_body(method) {
            Self::classify(headers, bytes)
        } else {
            InboundBody::Empty
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, InboundBody::Empty)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InboundBody::Empty => "empty",
            InboundBody::Json(_) => "json",
            InboundBody::Raw(_) => "raw",
        }
    }

    /// The JSON value, or `null` for anything else.
    pub fn into_json(self) -> Value {
        match self {
            InboundBody::Json(value) => value,
            InboundBody::Empty | InboundBody::Raw(_) => Value::Null,
        }
    }

    pub fn into_outbound(self) -> OutboundBody {
        match self {
            InboundBody::Empty => OutboundBody::Empty,
            InboundBody::Json(value) => OutboundBody::Bytes(Bytes::from(value.to_string())),
            InboundBody::Raw(bytes) => OutboundBody::Bytes(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn content_type(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_body_methods() {
        assert!(carries_body(&Method::POST));
        assert!(carries_body(&Method::PATCH));
        assert!(!carries_body(&Method::GET));
        assert!(!carries_body(&Method::DELETE));
    }

    #[test]
    fn test_get_body_is_dropped() {
        let body = InboundBody::for_method(
            &Method::GET,
            &content_type("application/json"),
            Bytes::from_static(b"{\"a\":1}"),
        );
        assert!(body.is_empty());
    }

    #[test]
    fn test_json_body() {
        let body = InboundBody::classify(
            &content_type("application/json; charset=utf-8"),
            Bytes::from_static(b"{\"a\":1}"),
        );
        assert_eq!(body, InboundBody::Json(json!({"a": 1})));
    }

    #[test]
    fn test_malformed_json_is_empty() {
        let body = InboundBody::classify(
            &content_type("application/json"),
            Bytes::from_static(b"{\"a\":"),
        );
        assert!(body.is_empty());
    }

    #[test]
    fn test_null_and_empty_string_json_are_empty() {
        let headers = content_type("application/json");
        assert!(InboundBody::classify(&headers, Bytes::from_static(b"null")).is_empty());
        assert!(InboundBody::classify(&headers, Bytes::from_static(b"\"\"")).is_empty());
        assert!(InboundBody::classify(&headers, Bytes::new()).is_empty());
    }

    #[test]
    fn test_text_passes_through() {
        let body = InboundBody::classify(&content_type("text/plain"), Bytes::from_static(b"prefs"));
        assert_eq!(body, InboundBody::Raw(Bytes::from_static(b"prefs")));
        assert_eq!(body.into_json(), Value::Null);
    }
}
