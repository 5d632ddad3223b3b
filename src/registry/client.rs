// src/registry/client.rs
use crate::checks::CheckSet;
use crate::config::ClientConfig;
use crate::metrics::{MetricsCollector, Timer};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

pub const CHECKS_PATH: &str = "/v1/agent/checks";

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Connect failure, timeout or a broken body stream.
    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Failed to create registry client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Anything that can produce a snapshot of registry checks.
#[async_trait]
pub trait CheckSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<CheckSet, RegistryError>;
}

/// Build the check listing URL for a registry address.
///
/// Bare `host:port` addresses are treated as plain HTTP.
pub fn checks_url(address: &str) -> Result<Url, url::ParseError> {
    let base = if address.contains("://") {
        Url::parse(address)?
    } else {
        Url::parse(&format!("http://{}", address))?
    };
    base.join(CHECKS_PATH)
}

pub struct RegistryClient {
    client: Client,
    metrics: Option<Arc<MetricsCollector>>,
}

impl RegistryClient {
    pub fn new(
        config: &ClientConfig,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(config.query_timeout())
            .pool_max_idle_per_host(config.max_idle_connections)
            .pool_idle_timeout(config.idle_connection_timeout())
            .build()?;

        Ok(Self { client, metrics })
    }

    async fn query(&self, url: &str) -> Result<CheckSet, RegistryError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;

        debug!("Registry responded with HTTP {}", response.status());

        let body = response
            .bytes()
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;

        // A literal `null` body decodes to an empty snapshot.
        let checks: Option<CheckSet> = serde_json::from_slice(&body)
            .map_err(|e| RegistryError::Unprocessable(e.to_string()))?;

        Ok(checks.unwrap_or_default())
    }
}

#[async_trait]
impl CheckSource for RegistryClient {
    async fn fetch(&self, url: &str) -> Result<CheckSet, RegistryError> {
        let timer = Timer::new();
        if let Some(metrics) = &self.metrics {
            metrics.registry_in_flight.inc();
        }

        let result = self.query(url).await;

        if let Some(metrics) = &self.metrics {
            metrics.registry_in_flight.dec();
            let outcome = match &result {
                Ok(_) => "success",
                Err(RegistryError::Unprocessable(_)) => "unprocessable",
                Err(_) => "unavailable",
            };
            metrics.record_registry_request(outcome, timer.elapsed());
        }

        match &result {
            Ok(checks) => debug!("Fetched {} checks from {}", checks.len(), url),
            Err(e) => warn!("Registry query to {} failed: {}", url, e),
        }

        result
    }
}
