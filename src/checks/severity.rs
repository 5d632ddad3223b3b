// src/checks/severity.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Health state reported by the registry for a single check.
///
/// Variants are declared worst-last so the derived ordering is the severity
/// ordering. `Maintenance` and `Critical` belong to the Consul vocabulary,
/// `Failing` to the three-level one; a [`SeverityScale`] decides which names
/// are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HealthSeverity {
    Passing,
    Warning,
    Maintenance,
    Critical,
    Failing,
}

impl HealthSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthSeverity::Passing => "passing",
            HealthSeverity::Warning => "warning",
            HealthSeverity::Maintenance => "maintenance",
            HealthSeverity::Critical => "critical",
            HealthSeverity::Failing => "failing",
        }
    }
}

impl fmt::Display for HealthSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityScale {
    /// passing < warning < maintenance < critical
    #[default]
    Consul,
    /// passing < warning < failing
    Simple,
}

const CONSUL_SCALE: [HealthSeverity; 4] = [
    HealthSeverity::Passing,
    HealthSeverity::Warning,
    HealthSeverity::Maintenance,
    HealthSeverity::Critical,
];

const SIMPLE_SCALE: [HealthSeverity; 3] = [
    HealthSeverity::Passing,
    HealthSeverity::Warning,
    HealthSeverity::Failing,
];

impl SeverityScale {
    /// Every severity of this scale, best first.
    pub fn severities(&self) -> &'static [HealthSeverity] {
        match self {
            SeverityScale::Consul => &CONSUL_SCALE,
            SeverityScale::Simple => &SIMPLE_SCALE,
        }
    }

    /// Exact, case-sensitive lookup of a registry status name.
    pub fn parse(&self, raw: &str) -> Option<HealthSeverity> {
        self.severities()
            .iter()
            .copied()
            .find(|severity| severity.as_str() == raw)
    }
}
