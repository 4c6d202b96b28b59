//! Request-level orchestration between the banner store and the cache
//!
//! The [`Resolver`] owns the consistency policy:
//! - creates go to the store first, then best-effort into the cache
//! - single-banner resolution reads the cache only when staleness is tolerated
//! - listing, updates and deletes always go to the store
//!
//! Updates and deletes never touch the cache. A snapshot cached before an
//! update or delete keeps being served until its TTL lapses.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::auth::{Access, Role};
use crate::cache::BannerCache;
use crate::context::{Interrupted, RequestContext};
use crate::error::{BannerError, CacheError, Result, StoreResult};
use crate::schema::types::{Banner, BannerFilter, BannerUpdate, BannerVersion, NewBanner, ResolveQuery};
use crate::store::BannerStore;

/// Cache-aside banner resolution
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn BannerStore>,
    cache: BannerCache,
}

impl Resolver {
    pub fn new(store: Arc<dyn BannerStore>, cache: BannerCache) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &BannerCache {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn BannerStore> {
        &self.store
    }

    /// Validate and persist a new banner, then prime the cache with it
    ///
    /// # Returns
    /// * `Ok(id)` - the store-assigned id
    /// * `Err(BannerError)` - authorization, validation or store failure
    ///
    /// A failure to cache the new banner is logged and does not fail the call.
    pub async fn create_banner(
        &self,
        ctx: &RequestContext,
        role: Role,
        banner: &NewBanner,
    ) -> Result<i64> {
        require(role, Access::AdminOnly)?;
        banner.validate()?;

        let now = Utc::now();
        let version = BannerVersion::new(banner.content.clone(), now);

        let banner_id = run_store(
            ctx,
            "insert_banner",
            self.store.insert_banner(banner, &version),
        )
        .await?;

        info!(
            request_id = %ctx.request_id(),
            "Created banner {} for feature {}", banner_id, banner.feature_id
        );

        let snapshot = banner.to_banner(banner_id, now);
        if let Err(e) = self.cache.save_banner(ctx, banner_id, &snapshot).await {
            warn!(
                request_id = %ctx.request_id(),
                "Failed to cache banner {}: {}", banner_id, e
            );
        }

        Ok(banner_id)
    }

    /// List banners whose tag set contains the filter's tags
    ///
    /// Out-of-range pagination is clamped before the store is queried.
    pub async fn list_banners(
        &self,
        ctx: &RequestContext,
        role: Role,
        filter: BannerFilter,
    ) -> Result<Vec<Banner>> {
        require(role, Access::AdminOnly)?;
        let filter = filter.clamped();

        debug!(
            request_id = %ctx.request_id(),
            "Listing banners for feature {} tags {:?} (limit {}, offset {})",
            filter.feature_id, filter.tag_ids, filter.limit, filter.offset
        );

        run_store(
            ctx,
            "get_banners",
            self.store.get_banners(
                &filter.tag_ids,
                filter.feature_id,
                filter.limit,
                filter.offset,
            ),
        )
        .await
    }

    /// Resolve the banner shown to a caller for an exact tag set and feature
    ///
    /// Returns an empty vector when nothing matches, otherwise exactly one
    /// banner. With `use_last_revision` unset a cached snapshot is preferred,
    /// even one older than the store. A cached inactive snapshot is never
    /// shown to a caller who cannot see inactive banners.
    pub async fn resolve_banner(
        &self,
        ctx: &RequestContext,
        role: Role,
        query: &ResolveQuery,
    ) -> Result<Vec<Banner>> {
        require(role, Access::AnyRole)?;

        if !query.use_last_revision {
            match self
                .cache
                .get_banner(ctx, &query.tag_ids, query.feature_id)
                .await
            {
                Ok(banner) if banner.is_active || role.can_see_inactive() => {
                    debug!(
                        request_id = %ctx.request_id(),
                        "Serving banner {} from cache", banner.banner_id
                    );
                    return Ok(vec![banner]);
                }
                Ok(banner) => {
                    debug!(
                        request_id = %ctx.request_id(),
                        "Cached banner {} is inactive, reading store", banner.banner_id
                    );
                }
                Err(e) => log_cache_fallback(ctx, &e),
            }
        }

        let rows = run_store(
            ctx,
            "get_banner",
            self.store
                .get_banner(&query.tag_ids, query.feature_id, role.can_see_inactive()),
        )
        .await?;

        Ok(Banner::most_recent(rows).into_iter().collect())
    }

    /// Replace a banner's attributes and the content of its current version
    pub async fn update_banner(
        &self,
        ctx: &RequestContext,
        role: Role,
        update: &BannerUpdate,
    ) -> Result<()> {
        require(role, Access::AdminOnly)?;
        update.validate()?;

        let found = run_store(
            ctx,
            "update_banner_by_id",
            self.store.update_banner_by_id(update, Utc::now()),
        )
        .await?;

        if !found {
            return Err(BannerError::NotFound(update.banner_id));
        }

        info!(request_id = %ctx.request_id(), "Updated banner {}", update.banner_id);
        Ok(())
    }

    /// Delete a banner and its version history
    pub async fn delete_banner(&self, ctx: &RequestContext, role: Role, banner_id: i64) -> Result<()> {
        require(role, Access::AdminOnly)?;

        let found = run_store(
            ctx,
            "delete_banner_by_id",
            self.store.delete_banner_by_id(banner_id),
        )
        .await?;

        if !found {
            return Err(BannerError::NotFound(banner_id));
        }

        info!(request_id = %ctx.request_id(), "Deleted banner {}", banner_id);
        Ok(())
    }
}

fn require(role: Role, access: Access) -> Result<()> {
    if access.permits(role) {
        Ok(())
    } else {
        Err(BannerError::AuthorizationDenied)
    }
}

/// Run a store call under the request context, naming it in any failure
async fn run_store<T, F>(ctx: &RequestContext, operation: &'static str, call: F) -> Result<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match ctx.guard(call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            warn!(request_id = %ctx.request_id(), "Store operation {} failed: {}", operation, e);
            Err(BannerError::store(operation, e))
        }
        Err(Interrupted::Cancelled) => Err(BannerError::Cancelled(operation)),
        Err(Interrupted::DeadlineExceeded) => Err(BannerError::DeadlineExceeded(operation)),
    }
}

fn log_cache_fallback(ctx: &RequestContext, error: &CacheError) {
    match error {
        CacheError::Miss(key) => {
            debug!(request_id = %ctx.request_id(), "Cache miss for {}, reading store", key)
        }
        other => {
            warn!(request_id = %ctx.request_id(), "Cache unavailable, reading store: {}", other)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, TtlStore};
    use crate::store::InMemoryBannerStore;

    fn resolver() -> Resolver {
        let config = CacheConfig::default();
        Resolver::new(
            Arc::new(InMemoryBannerStore::new()),
            BannerCache::new(Arc::new(TtlStore::new(config.clone())), config),
        )
    }

    #[tokio::test]
    async fn test_users_cannot_write() {
        let resolver = resolver();
        let ctx = RequestContext::new();

        let result = resolver
            .create_banner(&ctx, Role::User, &NewBanner::new(vec![1], 1, "x"))
            .await;
        assert!(matches!(result, Err(BannerError::AuthorizationDenied)));

        let result = resolver
            .list_banners(&ctx, Role::User, BannerFilter::new(vec![1], 1))
            .await;
        assert!(matches!(result, Err(BannerError::AuthorizationDenied)));
    }

    #[tokio::test]
    async fn test_validation_runs_before_store() {
        let resolver = resolver();
        let ctx = RequestContext::new();

        let result = resolver
            .create_banner(&ctx, Role::Admin, &NewBanner::new(vec![], 1, "x"))
            .await;
        assert!(matches!(result, Err(BannerError::ValidationFailed(_))));
    }

    #[tokio::test]
    async fn test_resolve_empty_when_nothing_matches() {
        let resolver = resolver();
        let ctx = RequestContext::new();

        let found = resolver
            .resolve_banner(&ctx, Role::User, &ResolveQuery::new(vec![1], 1))
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_missing_banner_is_not_found() {
        let resolver = resolver();
        let ctx = RequestContext::new();

        let update = BannerUpdate {
            banner_id: 42,
            tag_ids: vec![1],
            feature_id: 1,
            content: "x".into(),
            is_active: true,
        };
        assert!(matches!(
            resolver.update_banner(&ctx, Role::Admin, &update).await,
            Err(BannerError::NotFound(42))
        ));
        assert!(matches!(
            resolver.delete_banner(&ctx, Role::Admin, 42).await,
            Err(BannerError::NotFound(42))
        ));
    }
}
