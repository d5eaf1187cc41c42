//! Outbound header reconstruction.
//!
//! # Responsibilities
//! - Read the browser's `headers` directive (a JSON object in one header)
//! - Otherwise derive Accept / Content-Type / X-Requested-With from the
//!   inbound request
//! - Carry the inbound cookie unless the directive already supplies one
//! - Keep proxy-internal directives (`multipart`, `Headers`) off the wire

use axum::http::header::{ACCEPT, CONTENT_TYPE, COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};

use crate::upstream::multipart::MultipartSpec;

/// Inbound header carrying the JSON header directive.
pub const HEADER_DIRECTIVE: &str = "headers";

/// Directive key holding the multipart spec.
pub const MULTIPART_KEY: &str = "multipart";

/// Default Accept / Content-Type when the browser sent none.
pub const DEFAULT_MEDIA_TYPE: &str = "application/json";

pub const X_REQUESTED_WITH: &str = "x-requested-with";

/// Structured form of the headers the gateway sends upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSpec {
    pub accept: Option<String>,
    pub content_type: Option<String>,
    pub requested_with: Option<String>,
    pub cookie: Option<String>,
    pub multipart: Option<MultipartSpec>,
    /// Any other header named by the directive, in directive order.
    pub extra: Vec<(String, String)>,
}

impl HeaderSpec {
    /// Rebuild the outbound header set from an inbound request.
    pub fn from_request(headers: &HeaderMap, client_id: &str) -> Self {
        let directive = headers
            .get(HEADER_DIRECTIVE)
            .and_then(|v| v.to_str().ok())
            .and_then(|raw| match Self::from_directive(raw) {
                Ok(spec) => Some(spec),
                Err(e) => {
                    tracing::warn!(error = %e, "Unparseable header directive, using request headers");
                    None
                }
            });

        let mut spec = directive.unwrap_or_else(|| Self::from_inbound(headers, client_id));
        if spec.cookie.is_none() {
            spec.cookie = header_text(headers, COOKIE.as_str());
        }
        spec
    }

    /// Parse the JSON header directive. The parsed object is the whole
    /// outbound header set.
    pub fn from_directive(raw: &str) -> Result<Self, serde_json::Error> {
        let object: Map<String, Value> = serde_json::from_str(raw)?;
        let mut spec = Self::default();

        for (name, value) in object {
            let Some(value) = directive_value(&value) else {
                continue;
            };
            match name.to_ascii_lowercase().as_str() {
                "accept" => spec.accept = Some(value),
                "content-type" => spec.content_type = Some(value),
                X_REQUESTED_WITH => spec.requested_with = Some(value),
                "cookie" => spec.cookie = Some(value),
                MULTIPART_KEY => spec.multipart = Some(MultipartSpec::parse(&value)),
                HEADER_DIRECTIVE => {}
                _ => spec.extra.push((name, value)),
            }
        }

        Ok(spec)
    }

    /// Minimal header set derived from the inbound request itself.
    pub fn from_inbound(headers: &HeaderMap, client_id: &str) -> Self {
        Self {
            accept: Some(
                header_text(headers, ACCEPT.as_str())
                    .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string()),
            ),
            content_type: Some(
                header_text(headers, CONTENT_TYPE.as_str())
                    .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string()),
            ),
            requested_with: Some(
                header_text(headers, X_REQUESTED_WITH).unwrap_or_else(|| client_id.to_string()),
            ),
            ..Self::default()
        }
    }

    /// Wire headers. Content-Type is only sent alongside a body; names or
    /// values that cannot be represented are skipped.
    pub fn to_header_map(&self, with_body: bool) -> HeaderMap {
        let mut map = HeaderMap::new();

        let known = [
            (ACCEPT.as_str(), self.accept.as_deref()),
            (
                CONTENT_TYPE.as_str(),
                self.content_type.as_deref().filter(|_| with_body),
            ),
            (X_REQUESTED_WITH, self.requested_with.as_deref()),
            (COOKIE.as_str(), self.cookie.as_deref()),
        ];
        let extra = self.extra.iter().map(|(k, v)| (k.as_str(), Some(v.as_str())));

        for (name, value) in known.into_iter().chain(extra) {
            if let Some(value) = value {
                insert_header(&mut map, name, value);
            }
        }

        map
    }

    /// Names of the headers that will be sent, for logging without values.
    pub fn header_names(&self, with_body: bool) -> Vec<String> {
        self.to_header_map(with_body)
            .keys()
            .map(|k| k.as_str().to_string())
            .collect()
    }
}

/// Insert a header, logging and skipping anything not representable.
pub fn insert_header(map: &mut HeaderMap, name: &str, value: &str) {
    match (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(value)) => {
            map.insert(name, value);
        }
        _ => tracing::warn!(header = %name, "Skipping header that is not valid on the wire"),
    }
}

/// Text value of an inbound header, if present and visible ASCII.
pub fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn directive_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
