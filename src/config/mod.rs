// src/config/mod.rs
mod models;

pub use models::*;

use crate::registry::checks_url;
use anyhow::{Context, Result};
use std::path::Path;

const ENV_PREFIX: &str = "CONSULATE";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid Consul address '{0}': {1}")]
    InvalidConsulAddress(String, String),

    #[error("Unsupported default threshold '{0}' for severity scale {1:?}")]
    InvalidThreshold(String, crate::checks::SeverityScale),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("Metrics path must start with '/': {0}")]
    InvalidMetricsPath(String),
}

/// Load configuration from an optional file (YAML or JSON), then apply
/// `CONSULATE__SECTION__KEY` environment overrides.
pub async fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config> {
    let mut builder = ::config::Config::builder();

    if let Some(path) = path {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;

        let format = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => ::config::FileFormat::Yaml,
            _ => ::config::FileFormat::Json,
        };
        builder = builder.add_source(::config::File::from_str(&contents, format));
    }

    let config: Config = builder
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        )
        .build()
        .context("Failed to assemble configuration")?
        .try_deserialize()
        .context("Failed to parse configuration")?;

    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        checks_url(&self.server.consul_address).map_err(|e| {
            ConfigError::InvalidConsulAddress(self.server.consul_address.clone(), e.to_string())
        })?;

        if self.checks.threshold().is_none() {
            return Err(ConfigError::InvalidThreshold(
                self.checks.default_threshold.clone(),
                self.checks.severity_scale,
            ));
        }

        if self.client.query_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("client.query_timeout_ms"));
        }
        if self.server.read_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("server.read_timeout_secs"));
        }
        if self.server.write_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("server.write_timeout_secs"));
        }
        if self.server.shutdown_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout("server.shutdown_timeout_secs"));
        }

        if !self.metrics.path.starts_with('/') {
            return Err(ConfigError::InvalidMetricsPath(self.metrics.path.clone()));
        }

        Ok(())
    }

    /// Fully qualified URL of the registry's check listing.
    pub fn registry_url(&self) -> String {
        checks_url(&self.server.consul_address)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| self.server.consul_address.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{HealthSeverity, SeverityScale};
    use hyper::StatusCode;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.listen_address.port(), 8080);
        assert_eq!(config.server.consul_address, "localhost:8500");
        assert_eq!(config.server.read_timeout_secs, 10);
        assert_eq!(config.server.write_timeout_secs, 10);
        assert_eq!(config.server.shutdown_timeout_secs, 15);
        assert_eq!(config.client.query_timeout_ms, 5000);
        assert_eq!(config.client.max_idle_connections, 100);
        assert_eq!(config.client.idle_connection_timeout_secs, 90);
        assert_eq!(config.cache.duration_ms, 1000);
        assert_eq!(config.status_codes.success, StatusCode::OK);
        assert_eq!(config.status_codes.error, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(config.status_codes.no_checks, StatusCode::NOT_FOUND);
        assert_eq!(
            config.status_codes.registry_unavailable,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(config.checks.threshold(), Some(HealthSeverity::Passing));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_registry_url() {
        let config = Config::default();
        assert_eq!(config.registry_url(), "http://localhost:8500/v1/agent/checks");
    }

    #[test]
    fn test_validate_rejects_threshold_outside_scale() {
        let mut config = Config::default();
        config.checks.severity_scale = SeverityScale::Simple;
        config.checks.default_threshold = "critical".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold(_, SeverityScale::Simple))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_query_timeout() {
        let mut config = Config::default();
        config.client.query_timeout_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout(_))));
    }

    #[test]
    fn test_invalid_status_code_is_rejected() {
        let result: Result<StatusCodes, _> = serde_json::from_str(r#"{"success": 42}"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_yaml_file() {
        let path = std::env::temp_dir().join(format!("consulate-{}.yaml", uuid::Uuid::new_v4()));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(
                file,
                "server:\n  consul_address: \"consul.internal:8500\"\ncache:\n  duration_ms: 0\nstatus_codes:\n  error: 500\nchecks:\n  default_threshold: warning"
            )
            .unwrap();
        }

        let config = load_config(Some(&path)).await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.server.consul_address, "consul.internal:8500");
        assert_eq!(config.cache.duration_ms, 0);
        assert_eq!(config.status_codes.error, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(config.status_codes.success, StatusCode::OK);
        assert_eq!(config.checks.threshold(), Some(HealthSeverity::Warning));
    }

    #[tokio::test]
    async fn test_load_without_file_uses_defaults() {
        let config = load_config(None::<&str>).await.unwrap();
        assert_eq!(config.client.max_idle_connections, 100);
    }
}
