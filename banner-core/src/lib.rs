//! # Banner Core (banner-core)
//!
//! Banner resolution and cache consistency on top of a Neo4j store.
//!
//! ## Features
//!
//! - Transactional banner persistence with append-style version history
//! - Tag-set containment listing and exact-match resolution
//! - Best-effort TTL cache in front of single-banner resolution
//! - Role-sensitive visibility of inactive banners
//! - Per-request cancellation and deadlines
//!
//! ## Components
//!
//! ### BannerStore
//! The source of truth. [`Neo4jBannerStore`] persists banners as graph nodes;
//! [`InMemoryBannerStore`] keeps the same semantics in process memory.
//!
//! ### BannerCache
//! Snapshots of banners keyed by tag set and feature, expiring after five
//! minutes. Never authoritative, never fatal.
//!
//! ### Resolver
//! Decides which of the two answers a request.
//!
//! ```no_run
//! use banner_core::{
//!     BannerCache, CacheConfig, Neo4jBannerStore, Neo4jClient, Neo4jSettings, RequestContext,
//!     ResolveQuery, Resolver, Role, TtlStore,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Neo4jClient::connect(Neo4jSettings::from_env()).await?;
//!     let config = CacheConfig::default();
//!     let resolver = Resolver::new(
//!         Arc::new(Neo4jBannerStore::new(Arc::new(client))),
//!         BannerCache::new(Arc::new(TtlStore::new(config.clone())), config),
//!     );
//!
//!     let ctx = RequestContext::new();
//!     let found = resolver
//!         .resolve_banner(&ctx, Role::User, &ResolveQuery::new(vec![1, 2], 10))
//!         .await?;
//!     println!("Resolved: {:?}", found.first().map(|b| &b.content));
//!     Ok(())
//! }
//! ```
//!
//! ## Staleness
//!
//! Updates and deletes do not invalidate the cache. Callers that must see the
//! current store state set `use_last_revision` on the query.

pub mod auth;
pub mod cache;
pub mod connection;
pub mod context;
pub mod error;
pub mod resolver;
pub mod schema;
pub mod store;

// Re-export main types for convenience
pub use auth::{authenticate, authorize, Access, Role, ADMIN_TOKEN, USER_TOKEN};
pub use cache::{BannerCache, CacheBackend, CacheConfig, CacheStats, KeyStrategy, TtlStore};
pub use connection::{HealthCheckResult, HealthStatus, Neo4jClient, Neo4jSettings};
pub use context::{Interrupted, RequestContext};
pub use error::{BannerError, CacheError, Result, StoreError, StoreResult};
pub use resolver::Resolver;
pub use schema::{Banner, BannerFilter, BannerUpdate, BannerVersion, Content, NewBanner, ResolveQuery};
pub use store::{BannerStore, InMemoryBannerStore, Neo4jBannerStore};
