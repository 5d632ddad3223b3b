// src/checks/mod.rs
mod record;
mod result;
mod severity;

pub use record::{CheckDefinition, CheckError, CheckRecord, CheckSet, DefinitionDuration};
pub use result::{AggregateResult, CheckStatus, ResultStatus, StatusCounts};
pub use severity::{HealthSeverity, SeverityScale};
