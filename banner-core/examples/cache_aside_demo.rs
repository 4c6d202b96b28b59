//! Demonstrates cache-aside banner resolution
//!
//! This example shows how to:
//! - Create a banner and have it cached
//! - Observe the stale cached snapshot after an update
//! - Bypass the cache with `use_last_revision`
//!
//! Runs against the in-memory store; no database is needed.

use banner_core::{
    BannerCache, BannerUpdate, CacheConfig, InMemoryBannerStore, NewBanner, RequestContext,
    ResolveQuery, Resolver, Role, TtlStore,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = CacheConfig::default();
    let cache = TtlStore::new(config.clone());
    let resolver = Resolver::new(
        Arc::new(InMemoryBannerStore::new()),
        BannerCache::new(Arc::new(cache.clone()), config),
    );
    let ctx = RequestContext::new();

    // 1. Create
    println!("1. Creating banner...");
    let id = resolver
        .create_banner(
            &ctx,
            Role::Admin,
            &NewBanner::new(vec![1, 2], 10, r#"{"title":"A"}"#),
        )
        .await?;
    println!("   Created banner {}", id);

    // 2. Update
    println!("\n2. Updating content...");
    resolver
        .update_banner(
            &ctx,
            Role::Admin,
            &BannerUpdate {
                banner_id: id,
                tag_ids: vec![1, 2],
                feature_id: 10,
                content: r#"{"title":"B"}"#.into(),
                is_active: true,
            },
        )
        .await?;

    // 3. Resolve both ways
    println!("\n3. Resolving...");
    let query = ResolveQuery::new(vec![1, 2], 10);
    let cached = resolver.resolve_banner(&ctx, Role::User, &query).await?;
    let fresh = resolver
        .resolve_banner(&ctx, Role::User, &query.clone().last_revision(true))
        .await?;

    for (label, banners) in [("cache", &cached), ("store", &fresh)] {
        match banners.first() {
            Some(banner) => println!("   {:<5} -> {}", label, banner.content),
            None => println!("   {:<5} -> (none)", label),
        }
    }

    println!("\nCache stats: {}", cache.stats().await);
    Ok(())
}
