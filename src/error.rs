//! Gateway error taxonomy and its mapping onto HTTP responses.
//!
//! Upstream non-2xx answers are not errors: they are relayed as-is. These
//! variants cover what the gateway itself cannot complete.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::xml::XmlError;

/// Message returned when a multipart directive is missing or empty.
pub const INVALID_MULTIPART: &str = "Invalid multipart request";

/// Errors that end a request locally.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The form route was called without a usable multipart directive.
    #[error("{}", INVALID_MULTIPART)]
    InvalidMultipart,

    /// An array body does not line up with the directive's parts.
    #[error("Multipart body has {elements} elements for {parts} parts")]
    MultipartBodyMismatch { parts: usize, elements: usize },

    /// No response was received from the engine.
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// An upstream URL could not be assembled.
    #[error("Invalid upstream URL: {0}")]
    UpstreamUrl(#[from] url::ParseError),

    /// The model could not be rendered as XML.
    #[error(transparent)]
    Xml(#[from] XmlError),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidMultipart | GatewayError::MultipartBodyMismatch { .. } => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::Upstream(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Upstream(_) | GatewayError::UpstreamUrl(_) | GatewayError::Xml(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::BAD_REQUEST {
            tracing::warn!(error = %self, "Rejecting request");
            return (status, self.to_string()).into_response();
        }

        tracing::error!(error = %self, status = %status, "Request failed");
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
