//! Banner snapshots in the cache
//!
//! [`BannerCache`] derives keys from a (tag set, feature) pair and stores full
//! banner snapshots as JSON. It is never authoritative: every error it
//! returns is something the resolver logs and answers from the store instead.

use std::sync::Arc;

use tracing::debug;

use crate::cache::backend::CacheBackend;
use crate::cache::config::{CacheConfig, KeyStrategy};
use crate::cache::types::CacheKey;
use crate::context::RequestContext;
use crate::error::CacheError;
use crate::schema::types::{normalize_tags, Banner};

/// Read-through acceleration for single-banner resolution
#[derive(Clone)]
pub struct BannerCache {
    backend: Arc<dyn CacheBackend>,
    config: CacheConfig,
}

impl BannerCache {
    pub fn new(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Derive the cache key for a tag set and feature
    ///
    /// # Example
    /// ```
    /// use banner_core::cache::{BannerCache, CacheConfig, TtlStore};
    /// use std::sync::Arc;
    ///
    /// let cache = BannerCache::new(Arc::new(TtlStore::new(CacheConfig::default())), CacheConfig::default());
    /// assert_eq!(cache.cache_key(&[2, 1], 10), "banner:1,2?feature=10");
    /// ```
    pub fn cache_key(&self, tag_ids: &[i64], feature_id: i64) -> CacheKey {
        let tags = match self.config.key_strategy {
            KeyStrategy::Sorted => normalize_tags(tag_ids),
            KeyStrategy::CallerOrder => tag_ids.to_vec(),
        };

        let joined = tags
            .iter()
            .map(|tag| tag.to_string())
            .collect::<Vec<_>>()
            .join(",");

        format!("banner:{}?feature={}", joined, feature_id)
    }

    /// Store a snapshot of `banner` under its own tag set and feature
    ///
    /// The snapshot carries `banner_id`. An existing entry for the key is
    /// overwritten and the TTL restarts.
    pub async fn save_banner(
        &self,
        ctx: &RequestContext,
        banner_id: i64,
        banner: &Banner,
    ) -> Result<(), CacheError> {
        let key = self.cache_key(&banner.tag_ids, banner.feature_id);

        let mut snapshot = banner.clone();
        snapshot.banner_id = banner_id;
        let value = serde_json::to_string(&snapshot)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        let ttl = self.config.ttl_with_jitter();
        ctx.guard(self.backend.set(key.clone(), value, ttl))
            .await
            .map_err(|reason| CacheError::Backend(format!("cache write interrupted: {:?}", reason)))??;

        debug!("Cached banner {} under {} for {:?}", banner_id, key, ttl);
        Ok(())
    }

    /// Look up the snapshot stored for a tag set and feature
    ///
    /// # Returns
    /// * `Ok(banner)` on a hit
    /// * `Err(CacheError::Miss)` if the key is absent or expired
    /// * `Err(CacheError::Decode)` if the entry is not a banner snapshot
    /// * `Err(CacheError::Backend)` on transport failure or interruption
    pub async fn get_banner(
        &self,
        ctx: &RequestContext,
        tag_ids: &[i64],
        feature_id: i64,
    ) -> Result<Banner, CacheError> {
        let key = self.cache_key(tag_ids, feature_id);

        let raw = ctx
            .guard(self.backend.get(&key))
            .await
            .map_err(|reason| CacheError::Backend(format!("cache read interrupted: {:?}", reason)))??
            .ok_or_else(|| CacheError::Miss(key.clone()))?;

        serde_json::from_str(&raw).map_err(|e| CacheError::Decode {
            key,
            reason: e.to_string(),
        })
    }
}
