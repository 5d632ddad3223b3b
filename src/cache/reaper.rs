// src/cache/reaper.rs
use super::ResultCache;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

/// Sweep period for expired entries. Unrelated to the entry TTL.
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(60);

pub struct CacheReaper<V> {
    cache: Arc<dyn ResultCache<V>>,
    period: Duration,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
}

impl<V> CacheReaper<V>
where
    V: Send + Sync + 'static,
{
    pub fn new(cache: Arc<dyn ResultCache<V>>, period: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        Self {
            cache,
            period,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub async fn start(self: Arc<Self>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown_rx = self.shutdown_rx.clone();

        info!(
            "Starting {} cache reaper with interval: {:?}",
            self.cache.name(),
            self.period
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = self.cache.purge_expired();
                    if purged > 0 {
                        debug!("Purged {} expired cache entries", purged);
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Cache reaper shutting down");
                        break;
                    }
                }
            }
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
