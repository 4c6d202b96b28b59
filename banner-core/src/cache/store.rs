//! In-process TTL cache backend
//!
//! Entries expire after their TTL. An expired entry is dropped when its key is
//! read, when `cleanup_expired` runs, or by the sweep that inserts and reads
//! perform at most once per `cleanup_interval`. There is no capacity-based
//! eviction.

use crate::cache::{
    backend::CacheBackend,
    config::CacheConfig,
    entry::CacheEntry,
    types::{CacheKey, CacheStats, CacheValue},
};
use crate::error::CacheError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// TTL-bounded key/value cache held in process memory
///
/// Cloning shares the underlying storage.
#[derive(Clone)]
pub struct TtlStore {
    config: CacheConfig,
    store: Arc<RwLock<CacheStore>>,
}

/// Internal cache storage
struct CacheStore {
    entries: HashMap<CacheKey, CacheEntry>,
    stats: CacheStats,
    last_sweep: Instant,
}

impl CacheStore {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::default(),
            last_sweep: Instant::now(),
        }
    }

    /// Drop every expired entry, returning how many were removed
    fn purge_expired(&mut self, track_metrics: bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        self.last_sweep = Instant::now();

        let removed = before - self.entries.len();
        if track_metrics {
            self.stats.evictions_ttl += removed as u64;
            self.stats.entries = self.entries.len();
        }
        removed
    }
}

impl TtlStore {
    /// Create a new cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        info!("Initializing banner cache with config: {:?}", config);

        Self {
            config,
            store: Arc::new(RwLock::new(CacheStore::new())),
        }
    }

    /// Purge expired entries if `cleanup_interval` has passed since the last purge
    fn sweep_if_due(&self, store: &mut CacheStore) {
        if store.last_sweep.elapsed() < self.config.cleanup_interval {
            return;
        }

        let removed = store.purge_expired(self.config.enable_metrics);
        if removed > 0 {
            debug!("Swept {} expired entries", removed);
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Insert a value, overwriting any existing entry for the key
    pub async fn insert(&self, key: CacheKey, value: CacheValue, ttl: Duration) {
        let entry = CacheEntry::new(key.clone(), value, ttl);
        let mut store = self.store.write().await;
        self.sweep_if_due(&mut store);

        if store.entries.insert(key.clone(), entry).is_some() {
            debug!("Overwrote cache entry: {}", key);
        } else {
            debug!("Inserted cache entry: {}", key);
        }

        if self.config.enable_metrics {
            store.stats.writes += 1;
            store.stats.entries = store.entries.len();
        }
    }

    /// Get a value, treating an expired entry as absent
    pub async fn get(&self, key: &str) -> Option<CacheValue> {
        let mut store = self.store.write().await;
        self.sweep_if_due(&mut store);

        let expired = match store.entries.get(key) {
            Some(entry) if entry.is_expired() => true,
            Some(entry) => {
                let value = entry.value.clone();
                if self.config.enable_metrics {
                    store.stats.hits += 1;
                }
                debug!("Cache hit: {}", key);
                return Some(value);
            }
            None => false,
        };

        if expired {
            debug!("Cache entry expired: {}", key);
            store.entries.remove(key);
            if self.config.enable_metrics {
                store.stats.evictions_ttl += 1;
                store.stats.entries = store.entries.len();
            }
        } else {
            debug!("Cache miss: {}", key);
        }

        if self.config.enable_metrics {
            store.stats.misses += 1;
        }
        None
    }

    /// Check if a live entry exists for the key
    pub async fn contains_key(&self, key: &str) -> bool {
        let store = self.store.read().await;
        store
            .entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    /// Remove all expired entries, returning how many were dropped
    pub async fn cleanup_expired(&self) -> usize {
        let mut store = self.store.write().await;
        let removed = store.purge_expired(self.config.enable_metrics);

        if removed > 0 {
            debug!("Cleaned up {} expired entries", removed);
        }
        removed
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        store.stats.clone()
    }

    /// Get number of entries in cache, expired ones included until they are dropped
    pub async fn len(&self) -> usize {
        let store = self.store.read().await;
        store.entries.len()
    }

    /// Check if cache is empty
    pub async fn is_empty(&self) -> bool {
        let store = self.store.read().await;
        store.entries.is_empty()
    }
}

#[async_trait]
impl CacheBackend for TtlStore {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        Ok(TtlStore::get(self, key).await)
    }

    async fn set(&self, key: CacheKey, value: CacheValue, ttl: Duration) -> Result<(), CacheError> {
        self.insert(key, value, ttl).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> TtlStore {
        TtlStore::new(CacheConfig::default())
    }

    #[tokio::test]
    async fn test_basic_insert_and_get() {
        let cache = cache();

        cache
            .insert("key1".to_string(), "value1".to_string(), Duration::from_secs(60))
            .await;

        let value = cache.get("key1").await;
        assert_eq!(value, Some("value1".to_string()));

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.writes, 1);
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let cache = cache();

        assert_eq!(cache.get("nonexistent").await, None);
        assert_eq!(cache.stats().await.misses, 1);
    }

    #[tokio::test]
    async fn test_overwrite() {
        let cache = cache();

        cache
            .insert("key".to_string(), "first".to_string(), Duration::from_secs(60))
            .await;
        cache
            .insert("key".to_string(), "second".to_string(), Duration::from_secs(60))
            .await;

        assert_eq!(cache.get("key").await, Some("second".to_string()));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let cache = cache();

        cache
            .insert("key1".to_string(), "value1".to_string(), Duration::from_millis(100))
            .await;

        assert!(cache.get("key1").await.is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get("key1").await.is_none());
        assert!(!cache.contains_key("key1").await);

        let stats = cache.stats().await;
        assert_eq!(stats.evictions_ttl, 1);
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let cache = cache();

        cache
            .insert("short".to_string(), "a".to_string(), Duration::from_millis(50))
            .await;
        cache
            .insert("long".to_string(), "b".to_string(), Duration::from_secs(60))
            .await;

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.cleanup_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert!(cache.contains_key("long").await);
    }

    #[tokio::test]
    async fn test_no_capacity_eviction() {
        let cache = cache();

        for i in 0..1_000 {
            cache
                .insert(format!("key{}", i), "v".to_string(), Duration::from_secs(60))
                .await;
        }

        assert_eq!(cache.len().await, 1_000);
        assert!(cache.get("key0").await.is_some());
    }

    #[tokio::test]
    async fn test_metrics_disabled() {
        let cache = TtlStore::new(CacheConfig::builder().enable_metrics(false).build());

        cache
            .insert("key".to_string(), "v".to_string(), Duration::from_secs(60))
            .await;
        cache.get("key").await;
        cache.get("other").await;

        assert_eq!(cache.stats().await, CacheStats::default());
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let cache = cache();
        let clone = cache.clone();

        clone
            .insert("key".to_string(), "v".to_string(), Duration::from_secs(60))
            .await;

        assert!(cache.contains_key("key").await);
    }

    #[tokio::test]
    async fn test_expired_entries_swept_without_reads() {
        let cache = TtlStore::new(
            CacheConfig::builder()
                .cleanup_interval(Duration::from_millis(10))
                .build(),
        );

        for i in 0..500 {
            cache
                .insert(format!("banner:{}", i), "v".to_string(), Duration::from_millis(5))
                .await;
        }

        tokio::time::sleep(Duration::from_millis(50)).await;

        // Reading an unrelated key sweeps the lapsed ones
        assert!(cache.get("unrelated").await.is_none());
        assert_eq!(cache.len().await, 0);

        let stats = cache.stats().await;
        assert_eq!(stats.evictions_ttl, 500);
        assert_eq!(stats.entries, 0);
    }

    #[tokio::test]
    async fn test_insert_sweeps_when_due() {
        let cache = TtlStore::new(
            CacheConfig::builder()
                .cleanup_interval(Duration::from_millis(10))
                .build(),
        );

        cache
            .insert("short".to_string(), "a".to_string(), Duration::from_millis(5))
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        cache
            .insert("fresh".to_string(), "b".to_string(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.len().await, 1);
        assert!(cache.contains_key("fresh").await);
    }

    #[tokio::test]
    async fn test_sweep_waits_for_interval() {
        let cache = cache();

        cache
            .insert("short".to_string(), "a".to_string(), Duration::from_millis(5))
            .await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The default interval has not passed, so the lapsed entry stays
        cache
            .insert("other".to_string(), "b".to_string(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.len().await, 2);
    }
}
