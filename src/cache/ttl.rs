// src/cache/ttl.rs
use super::ResultCache;
use dashmap::DashMap;
use tokio::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// In-memory cache whose entries expire a fixed time after insertion.
///
/// Expired entries stay in the map until `purge_expired` runs but are never
/// returned by `get`.
pub struct TtlCache<V> {
    ttl: Duration,
    entries: DashMap<String, CacheEntry<V>>,
}

impl<V> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Entries held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> ResultCache<V> for TtlCache<V>
where
    V: Clone + Send + Sync,
{
    fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.expires_at > Instant::now() {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn set(&self, key: &str, value: V) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.insert(key.to_string(), entry);
    }

    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    fn name(&self) -> &'static str {
        "ttl"
    }
}
