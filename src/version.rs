// src/version.rs
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const REVISION: &str = env!("CONSULATE_GIT_HASH");
pub const RUST_VERSION: &str = env!("CONSULATE_RUST_VERSION");
const BUILD_TIME: &str = env!("CONSULATE_BUILD_TIME");

/// Build and process metadata served by `/about`.
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    #[serde(rename = "Name")]
    pub name: &'static str,
    #[serde(rename = "Version")]
    pub version: &'static str,
    #[serde(rename = "Revision")]
    pub revision: &'static str,
    #[serde(rename = "BuildDate")]
    pub build_date: String,
    #[serde(rename = "RustVersion")]
    pub rust_version: &'static str,
    #[serde(rename = "StartTime")]
    pub start_time: String,
}

impl BuildInfo {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        let build_date = BUILD_TIME
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|date| date.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();

        Self {
            name: NAME,
            version: VERSION,
            revision: REVISION,
            build_date,
            rust_version: RUST_VERSION,
            start_time: started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// One-line banner logged at startup.
    pub fn summary(&self) -> String {
        format!(
            "{} {} (revision: {}, built: {}, rustc: {})",
            self.name, self.version, self.revision, self.build_date, self.rust_version
        )
    }
}
