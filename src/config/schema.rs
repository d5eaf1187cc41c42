//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Upstream engine connection.
    pub upstream: UpstreamConfig,

    /// How upstream responses are relayed to the browser.
    pub relay: RelayConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8081").
    pub bind_address: String,

    /// Maximum inbound request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8081".to_string(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Upstream engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the engine REST API, without trailing slash.
    pub base_url: String,

    /// Engine model version used in alert URLs and XML `version` attributes.
    pub model_version: String,

    /// Default `X-Requested-With` value sent to the engine.
    pub client_id: String,

    /// Accept self-signed engine certificates.
    pub accept_invalid_certs: bool,

    /// Total upstream request timeout in seconds. Unset means no timeout.
    pub timeout_secs: Option<u64>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost:8443".to_string(),
            model_version: "4.5.2".to_string(),
            client_id: "OpenAPI".to_string(),
            accept_invalid_certs: true,
            timeout_secs: None,
        }
    }
}

/// Response relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Attach upstream response headers under `headers` on JSON object bodies.
    pub attach_upstream_headers: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            attach_upstream_headers: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9091".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8081");
        assert_eq!(config.upstream.model_version, "4.5.2");
        assert!(config.upstream.timeout_secs.is_none());
        assert!(config.relay.attach_upstream_headers);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [upstream]
            base_url = "https://engine:8443"
            timeout_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.upstream.base_url, "https://engine:8443");
        assert_eq!(config.upstream.timeout_secs, Some(30));
        assert_eq!(config.upstream.client_id, "OpenAPI");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8081");
    }
}
