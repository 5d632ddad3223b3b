// src/config/models.rs
use crate::checks::{HealthSeverity, SeverityScale};
use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub cache: CacheConfig,
    pub status_codes: StatusCodes,
    pub checks: ChecksConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: SocketAddr,
    /// `host:port` of the Consul agent HTTP API.
    pub consul_address: String,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            consul_address: "localhost:8500".to_string(),
            read_timeout_secs: 10,
            write_timeout_secs: 10,
            shutdown_timeout_secs: 15,
        }
    }
}

/// Tuning for the pooled client used to query the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub query_timeout_ms: u64,
    pub max_idle_connections: usize,
    pub idle_connection_timeout_secs: u64,
}

impl ClientConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn idle_connection_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_connection_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: 5000,
            max_idle_connections: 100,
            idle_connection_timeout_secs: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Zero disables caching.
    pub duration_ms: u64,
}

impl CacheConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { duration_ms: 1000 }
    }
}

/// HTTP status returned for each aggregation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusCodes {
    #[serde(with = "status_code")]
    pub success: StatusCode,
    #[serde(with = "status_code")]
    pub partial_success: StatusCode,
    #[serde(with = "status_code")]
    pub warning: StatusCode,
    #[serde(with = "status_code")]
    pub error: StatusCode,
    #[serde(with = "status_code")]
    pub bad_request: StatusCode,
    #[serde(with = "status_code")]
    pub no_checks: StatusCode,
    #[serde(with = "status_code")]
    pub unprocessable: StatusCode,
    #[serde(with = "status_code")]
    pub registry_unavailable: StatusCode,
}

impl Default for StatusCodes {
    fn default() -> Self {
        Self {
            success: StatusCode::OK,
            partial_success: StatusCode::OK,
            warning: StatusCode::TOO_MANY_REQUESTS,
            error: StatusCode::TOO_MANY_REQUESTS,
            bad_request: StatusCode::BAD_REQUEST,
            no_checks: StatusCode::NOT_FOUND,
            unprocessable: StatusCode::UNPROCESSABLE_ENTITY,
            registry_unavailable: StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksConfig {
    /// Threshold applied when a request carries no `status` parameter.
    pub default_threshold: String,
    pub severity_scale: SeverityScale,
}

impl ChecksConfig {
    pub fn threshold(&self) -> Option<HealthSeverity> {
        self.severity_scale.parse(&self.default_threshold)
    }
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            default_threshold: HealthSeverity::Passing.to_string(),
            severity_scale: SeverityScale::Consul,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9090,
            path: "/metrics".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
}

mod status_code {
    use hyper::StatusCode;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(code: &StatusCode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(code.as_u16())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<StatusCode, D::Error> {
        let raw = u16::deserialize(deserializer)?;
        StatusCode::from_u16(raw)
            .map_err(|_| de::Error::custom(format!("invalid HTTP status code: {}", raw)))
    }
}
