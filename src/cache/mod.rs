// src/cache/mod.rs
mod noop;
mod reaper;
mod ttl;

pub use noop::NoOpCache;
pub use reaper::{CacheReaper, DEFAULT_REAP_INTERVAL};
pub use ttl::TtlCache;

use crate::config::CacheConfig;
use std::sync::Arc;

/// Keyed store for registry snapshots.
pub trait ResultCache<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;

    /// Insert or replace `key`, using the cache's configured lifetime.
    fn set(&self, key: &str, value: V);

    /// Drop entries that can no longer be read. Caches without expiry have
    /// nothing to do.
    fn purge_expired(&self) -> usize {
        0
    }

    fn name(&self) -> &'static str;
}

/// Pick the cache strategy for `config`: a zero duration disables caching.
pub fn create_cache<V>(config: &CacheConfig) -> Arc<dyn ResultCache<V>>
where
    V: Clone + Send + Sync + 'static,
{
    let ttl = config.duration();
    if ttl.is_zero() {
        tracing::info!("Registry result caching disabled");
        Arc::new(NoOpCache)
    } else {
        tracing::info!("Caching registry results for {:?}", ttl);
        Arc::new(TtlCache::new(ttl))
    }
}
