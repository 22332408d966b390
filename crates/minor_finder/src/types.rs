use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::catalog::{CachedCatalog, CatalogBackend};
use crate::config::AppConfig;

/// State shared by every request handler.
pub struct AppState {
    /// Cached catalog; every request reads through it
    pub catalog: CachedCatalog<CatalogBackend>,
    pub config: AppConfig,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(backend: CatalogBackend, config: AppConfig) -> Self {
        Self {
            catalog: CachedCatalog::new(backend, config.cache.ttl()),
            config,
            started_at: Utc::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        (Utc::now() - self.started_at).to_std().unwrap_or_default()
    }

    /// Drops expired catalog pages once per TTL (at least every second).
    ///
    /// The task holds only a weak reference and ends once the state is gone.
    pub fn spawn_cache_cleanup(self: &Arc<Self>) -> JoinHandle<()> {
        let state = Arc::downgrade(self);
        let period = self.config.cache.ttl().max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(state) = state.upgrade() else {
                    break;
                };
                state.catalog.cleanup_expired();
                debug!(
                    active = state.catalog.stats().active_entries,
                    "Cleaned up expired catalog pages"
                );
            }
        })
    }
}
