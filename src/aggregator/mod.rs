// src/aggregator/mod.rs
mod matcher;
mod resolver;
mod verdict;

pub use matcher::CheckMatcher;
pub use resolver::{Aggregator, Resolution};
pub use verdict::Verdict;
