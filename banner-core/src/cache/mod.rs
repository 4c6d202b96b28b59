//! # Banner Cache
//!
//! Best-effort, TTL-bounded snapshots of resolved banners.
//!
//! ## Features
//!
//! - **TTL-Based Expiration**: entries live for a fixed time-to-live (5 minutes by default)
//! - **No Capacity Eviction**: expiry is the only way an entry leaves the cache
//! - **Pluggable Backend**: anything implementing [`CacheBackend`] can hold the snapshots
//! - **Key Strategy**: tag ids are sorted before key derivation unless caller order is requested
//!
//! ## Example
//!
//! ```rust
//! use banner_core::cache::{BannerCache, CacheConfig, TtlStore};
//! use banner_core::context::RequestContext;
//! use banner_core::schema::NewBanner;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = CacheConfig::default();
//! let cache = BannerCache::new(Arc::new(TtlStore::new(config.clone())), config);
//! let ctx = RequestContext::new();
//!
//! let banner = NewBanner::new(vec![1, 2], 10, r#"{"title":"A"}"#).to_banner(1, chrono::Utc::now());
//! cache.save_banner(&ctx, 1, &banner).await?;
//!
//! if let Ok(hit) = cache.get_banner(&ctx, &[1, 2], 10).await {
//!     println!("Cache hit: {}", hit.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod banner;
pub mod config;
pub mod entry;
pub mod store;
pub mod types;

pub use backend::CacheBackend;
pub use banner::BannerCache;
pub use config::{
    CacheConfig, CacheConfigBuilder, KeyStrategy, DEFAULT_BANNER_TTL, DEFAULT_CLEANUP_INTERVAL,
    MAX_BANNER_TTL,
};
pub use entry::CacheEntry;
pub use store::TtlStore;
pub use types::{CacheKey, CacheStats, CacheValue};
