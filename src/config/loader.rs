//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the upstream engine base URL.
pub const ENV_UPSTREAM_URL: &str = "MIRTH_API_URL";

/// Environment variable overriding the listener bind address.
pub const ENV_BIND_ADDRESS: &str = "GATEWAY_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration.
///
/// Defaults, then the TOML file when given, then environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    let config = apply_env_overrides(config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides(
    mut config: GatewayConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> GatewayConfig {
    if let Some(url) = lookup(ENV_UPSTREAM_URL).filter(|v| !v.is_empty()) {
        config.upstream.base_url = url;
    }
    if let Some(address) = lookup(ENV_BIND_ADDRESS).filter(|v| !v.is_empty()) {
        config.listener.bind_address = address;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_base_url() {
        let config = apply_env_overrides(GatewayConfig::default(), |key| match key {
            ENV_UPSTREAM_URL => Some("https://mirth.internal:8443".to_string()),
            _ => None,
        });
        assert_eq!(config.upstream.base_url, "https://mirth.internal:8443");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8081");
    }

    #[test]
    fn test_empty_env_is_ignored() {
        let config = apply_env_overrides(GatewayConfig::default(), |_| Some(String::new()));
        assert_eq!(config.upstream.base_url, "https://localhost:8443");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Some(Path::new("/nonexistent/gateway.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ConfigError::Validation(vec![
            ValidationError::ZeroTimeout,
            ValidationError::EmptyModelVersion,
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: upstream.timeout_secs must be greater than zero, \
             upstream.model_version must not be empty"
        );
    }
}
