//! Configuration loading from disk and the environment.
//!
//! Configuration is assembled exactly once at startup: file values, then
//! environment overrides, then validation. Nothing re-reads the environment
//! per request.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: GatewayConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build a configuration from defaults plus environment overrides.
pub fn default_config() -> Result<GatewayConfig, ConfigError> {
    let mut config = GatewayConfig::default();

    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `PORT` and `UPSTREAM_URL` overrides from the environment.
///
/// `PORT` replaces only the port component of the bind address.
fn apply_env_overrides(config: &mut GatewayConfig) {
    if let Ok(port) = std::env::var("PORT") {
        if port.parse::<u16>().is_ok() {
            let host = config
                .listener
                .bind_address
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());
            config.listener.bind_address = format!("{}:{}", host, port);
        } else {
            tracing::warn!(port = %port, "Ignoring invalid PORT override");
        }
    }

    if let Ok(url) = std::env::var("UPSTREAM_URL") {
        if !url.is_empty() {
            config.upstream.base_url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_parses_routes_and_upstream() {
        let dir = std::env::temp_dir().join("cors-gateway-loader-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gateway.toml");
        fs::write(
            &path,
            r#"
            [listener]
            bind_address = "127.0.0.1:3100"

            [upstream]
            base_url = "http://10.0.0.5:8080"

            [[routes]]
            name = "api"
            path_prefix = "/api"
            upstream_prefix = ""
            "#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:3100");
        assert_eq!(config.upstream.base_url, "http://10.0.0.5:8080");
        assert_eq!(config.routes.len(), 1);
    }

    #[test]
    fn load_config_rejects_invalid_upstream() {
        let dir = std::env::temp_dir().join("cors-gateway-loader-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        fs::write(
            &path,
            r#"
            [upstream]
            base_url = "not a url"
            "#,
        )
        .unwrap();

        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Validation(_))
        ));
    }
}
