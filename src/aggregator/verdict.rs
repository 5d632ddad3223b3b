// src/aggregator/verdict.rs
use crate::checks::{ResultStatus, StatusCounts};
use crate::config::StatusCodes;
use hyper::StatusCode;

/// Overall outcome of one aggregation, before it is mapped to HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// At least one check failed.
    Failed,
    /// Only warnings, nothing passing.
    WarningOnly,
    /// Warnings alongside passing checks.
    PartialSuccess,
    NoChecks,
    Ok,
}

impl Verdict {
    /// First matching rule wins; the order is significant.
    pub fn from_counts(counts: &StatusCounts, total: usize, matched: usize) -> Self {
        if counts.failing > 0 {
            Verdict::Failed
        } else if counts.passing == 0 && counts.warning > 0 {
            Verdict::WarningOnly
        } else if counts.warning > 0 {
            Verdict::PartialSuccess
        } else if total == 0 || matched == 0 {
            Verdict::NoChecks
        } else {
            Verdict::Ok
        }
    }

    pub fn result_status(&self) -> ResultStatus {
        match self {
            Verdict::Failed | Verdict::WarningOnly => ResultStatus::Failed,
            Verdict::PartialSuccess => ResultStatus::Warning,
            Verdict::NoChecks => ResultStatus::NoChecks,
            Verdict::Ok => ResultStatus::Ok,
        }
    }

    pub fn status_code(&self, codes: &StatusCodes) -> StatusCode {
        match self {
            Verdict::Failed => codes.error,
            Verdict::WarningOnly => codes.warning,
            Verdict::PartialSuccess => codes.partial_success,
            Verdict::NoChecks => codes.no_checks,
            Verdict::Ok => codes.success,
        }
    }
}
