// src/cache/noop.rs
use super::ResultCache;

/// Cache used when caching is disabled: every lookup misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpCache;

impl<V> ResultCache<V> for NoOpCache {
    fn get(&self, _key: &str) -> Option<V> {
        None
    }

    fn set(&self, _key: &str, _value: V) {}

    fn name(&self) -> &'static str {
        "noop"
    }
}
