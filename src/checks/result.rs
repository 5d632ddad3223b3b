// src/checks/result.rs
use super::record::CheckSet;
use super::severity::HealthSeverity;
use serde::{Deserialize, Serialize};

/// Outcome of comparing one check against a severity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckStatus {
    Passing,
    Warning,
    Failing,
}

impl CheckStatus {
    pub fn classify(severity: HealthSeverity, threshold: HealthSeverity) -> Self {
        if severity <= threshold {
            CheckStatus::Passing
        } else if severity == HealthSeverity::Warning {
            CheckStatus::Warning
        } else {
            CheckStatus::Failing
        }
    }
}

/// Per-classification tally. All three buckets always exist so a zero is
/// distinguishable from an absent key on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub failing: usize,
    pub passing: usize,
    pub warning: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: CheckStatus) {
        match status {
            CheckStatus::Passing => self.passing += 1,
            CheckStatus::Warning => self.warning += 1,
            CheckStatus::Failing => self.failing += 1,
        }
    }

    pub fn get(&self, status: CheckStatus) -> usize {
        match status {
            CheckStatus::Passing => self.passing,
            CheckStatus::Warning => self.warning,
            CheckStatus::Failing => self.failing,
        }
    }

    pub fn total(&self) -> usize {
        self.passing + self.warning + self.failing
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultStatus {
    Ok,
    Warning,
    Failed,
    #[serde(rename = "No Checks")]
    NoChecks,
}

/// Body returned by every verify endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    #[serde(rename = "Status")]
    pub status: ResultStatus,

    #[serde(rename = "Detail", default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    #[serde(rename = "Counts", default, skip_serializing_if = "Option::is_none")]
    pub counts: Option<StatusCounts>,

    #[serde(rename = "Checks", default, skip_serializing_if = "Option::is_none")]
    pub checks: Option<CheckSet>,
}

impl AggregateResult {
    pub fn ok() -> Self {
        Self::with_status(ResultStatus::Ok)
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::with_status(ResultStatus::Failed)
        }
    }

    pub fn no_checks(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::with_status(ResultStatus::NoChecks)
        }
    }

    pub fn tallied(status: ResultStatus, counts: StatusCounts, checks: CheckSet) -> Self {
        Self {
            status,
            detail: None,
            counts: Some(counts),
            checks: if checks.is_empty() { None } else { Some(checks) },
        }
    }

    fn with_status(status: ResultStatus) -> Self {
        Self {
            status,
            detail: None,
            counts: None,
            checks: None,
        }
    }
}
