//! TTL-based caching for catalog pages.

use super::error::CatalogError;
use super::CatalogSource;
use crate::requirements::{MinorListing, MinorRequirements};
use dashmap::DashMap;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

const MINORS_KEY: &str = "minors";
const MAJORS_KEY: &str = "majors";

/// A cached value with metadata.
#[derive(Clone)]
struct CachedPage<V> {
    value: V,
    cached_at: Instant,
    ttl: Duration,
}

impl<V> CachedPage<V> {
    fn is_fresh(&self) -> bool {
        self.cached_at.elapsed() < self.ttl
    }
}

/// Thread-safe TTL cache keyed by page URL.
///
/// Uses DashMap for concurrent access without external locking.
pub struct TtlCache<V> {
    entries: DashMap<String, CachedPage<V>>,
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    /// Gets a cached value if it exists and hasn't expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.entries.get(key)?;
        if entry.is_fresh() {
            return Some(entry.value.clone());
        }
        // Expired, remove it
        drop(entry);
        self.entries.remove(key);
        None
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.entries.insert(
            key.into(),
            CachedPage {
                value,
                cached_at: Instant::now(),
                ttl: self.default_ttl,
            },
        );
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Removes expired entries from the cache.
    pub fn cleanup_expired(&self) {
        self.entries.retain(|_, entry| entry.is_fresh());
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        for entry in self.entries.iter() {
            stats.total_entries += 1;
            if entry.is_fresh() {
                stats.active_entries += 1;
            } else {
                stats.expired_entries += 1;
            }
        }
        stats
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

impl std::ops::Add for CacheStats {
    type Output = CacheStats;

    fn add(self, other: CacheStats) -> CacheStats {
        CacheStats {
            total_entries: self.total_entries + other.total_entries,
            expired_entries: self.expired_entries + other.expired_entries,
            active_entries: self.active_entries + other.active_entries,
        }
    }
}

/// Wraps a [`CatalogSource`] and remembers successful responses for a TTL.
///
/// Failures are never cached, so a minor whose page failed to load is
/// fetched again on the next request.
pub struct CachedCatalog<S> {
    inner: S,
    listings: TtlCache<Vec<MinorListing>>,
    pages: TtlCache<MinorRequirements>,
    majors: TtlCache<Vec<String>>,
}

impl<S: CatalogSource> CachedCatalog<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            listings: TtlCache::new(ttl),
            pages: TtlCache::new(ttl),
            majors: TtlCache::new(ttl),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.listings.stats() + self.pages.stats() + self.majors.stats()
    }

    /// Drops every cached page.
    pub fn clear(&self) {
        self.listings.clear();
        self.pages.clear();
        self.majors.clear();
    }

    /// Drops expired pages; lookups already skip them, this only frees memory.
    pub fn cleanup_expired(&self) {
        self.listings.cleanup_expired();
        self.pages.cleanup_expired();
        self.majors.cleanup_expired();
    }
}

impl<S: CatalogSource> CatalogSource for CachedCatalog<S> {
    async fn list_minors(&self) -> Result<Vec<MinorListing>, CatalogError> {
        if let Some(listings) = self.listings.get(MINORS_KEY) {
            debug!(count = listings.len(), "Minor list served from cache");
            return Ok(listings);
        }
        let listings = self.inner.list_minors().await?;
        self.listings.insert(MINORS_KEY, listings.clone());
        Ok(listings)
    }

    async fn get_requirements(&self, url: &str) -> Result<MinorRequirements, CatalogError> {
        if let Some(requirements) = self.pages.get(url) {
            debug!(url = %url, "Requirements served from cache");
            return Ok(requirements);
        }
        let requirements = self.inner.get_requirements(url).await?;
        self.pages.insert(url, requirements.clone());
        Ok(requirements)
    }

    async fn list_majors(&self) -> Result<Vec<String>, CatalogError> {
        if let Some(majors) = self.majors.get(MAJORS_KEY) {
            return Ok(majors);
        }
        let majors = self.inner.list_majors().await?;
        self.majors.insert(MAJORS_KEY, majors.clone());
        Ok(majors)
    }
}
