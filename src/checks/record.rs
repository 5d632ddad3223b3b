// src/checks/record.rs
use super::result::CheckStatus;
use super::severity::{HealthSeverity, SeverityScale};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One snapshot of the registry, keyed by check id.
pub type CheckSet = BTreeMap<String, CheckRecord>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("Unsupported status: {0}")]
    UnsupportedStatus(String),
}

/// A single check as reported by `GET /v1/agent/checks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckRecord {
    #[serde(rename = "Node")]
    pub node: String,

    #[serde(rename = "CheckID")]
    pub check_id: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Status")]
    pub status: String,

    #[serde(rename = "Notes")]
    pub notes: String,

    #[serde(rename = "Output")]
    pub output: String,

    #[serde(rename = "ServiceID")]
    pub service_id: String,

    #[serde(rename = "ServiceName")]
    pub service_name: String,

    #[serde(rename = "ServiceTags", deserialize_with = "null_as_default")]
    pub service_tags: Vec<String>,

    // Opaque to aggregation and never echoed back to callers.
    #[serde(rename = "Definition", skip_serializing, deserialize_with = "null_as_default")]
    pub definition: CheckDefinition,

    #[serde(rename = "CreateIndex")]
    pub create_index: u64,

    #[serde(rename = "ModifyIndex")]
    pub modify_index: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckDefinition {
    #[serde(rename = "HTTP")]
    pub http: String,

    #[serde(rename = "Header", deserialize_with = "null_as_default")]
    pub header: HashMap<String, Vec<String>>,

    #[serde(rename = "Method")]
    pub method: String,

    #[serde(rename = "TLSSkipVerify")]
    pub tls_skip_verify: bool,

    #[serde(rename = "TCP")]
    pub tcp: String,

    #[serde(rename = "Interval")]
    pub interval: Option<DefinitionDuration>,

    #[serde(rename = "Timeout")]
    pub timeout: Option<DefinitionDuration>,

    #[serde(rename = "DeregisterCriticalServiceAfter")]
    pub deregister_critical_service_after: Option<DefinitionDuration>,
}

/// Consul renders durations either as nanoseconds or as `"10s"` style text
/// depending on version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefinitionDuration {
    Nanos(u64),
    Text(String),
}

impl CheckRecord {
    pub fn is_check_id(&self, check_id: &str) -> bool {
        self.check_id == check_id
    }

    pub fn is_check_name(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn is_service_id(&self, service_id: &str) -> bool {
        self.service_id == service_id
    }

    pub fn is_service_name(&self, service_name: &str) -> bool {
        self.service_name == service_name
    }

    pub fn severity(&self, scale: SeverityScale) -> Result<HealthSeverity, CheckError> {
        scale
            .parse(&self.status)
            .ok_or_else(|| CheckError::UnsupportedStatus(self.status.clone()))
    }

    /// Classify this check against `threshold`.
    ///
    /// Anything at or below the threshold passes. Above it, only the warning
    /// tier is reported as a warning; every worse state fails.
    pub fn classify(
        &self,
        threshold: HealthSeverity,
        scale: SeverityScale,
    ) -> Result<CheckStatus, CheckError> {
        Ok(CheckStatus::classify(self.severity(scale)?, threshold))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
