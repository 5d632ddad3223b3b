// src/aggregator/matcher.rs
use crate::checks::CheckRecord;

/// Selects which registry checks take part in a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckMatcher {
    All,
    CheckId(String),
    CheckName(String),
    ServiceId(String),
    ServiceName(String),
}

impl CheckMatcher {
    pub fn matches(&self, check: &CheckRecord) -> bool {
        match self {
            CheckMatcher::All => true,
            CheckMatcher::CheckId(id) => check.is_check_id(id),
            CheckMatcher::CheckName(name) => check.is_check_name(name),
            CheckMatcher::ServiceId(id) => check.is_service_id(id),
            CheckMatcher::ServiceName(name) => check.is_service_name(name),
        }
    }

    /// Detail reported when nothing matched.
    pub fn no_checks_detail(&self) -> String {
        match self {
            CheckMatcher::All => "No checks".to_string(),
            CheckMatcher::CheckId(id) => format!("No checks with CheckID: {}", id),
            CheckMatcher::CheckName(name) => format!("No checks with CheckName: {}", name),
            CheckMatcher::ServiceId(id) => {
                format!("No checks for services with ServiceId: {}", id)
            }
            CheckMatcher::ServiceName(name) => {
                format!("No checks for services with ServiceName: {}", name)
            }
        }
    }
}
