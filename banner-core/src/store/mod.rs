//! Durable banner storage
//!
//! [`BannerStore`] is the source of truth. Validation is not its concern;
//! it persists what it is given and answers containment and exact-match
//! queries in a stable order.

pub mod memory;
pub mod neo4j;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::schema::{Banner, BannerUpdate, BannerVersion, NewBanner};

pub use memory::InMemoryBannerStore;
pub use neo4j::Neo4jBannerStore;

/// Transactional, ordered persistence for banners and their versions
#[async_trait]
pub trait BannerStore: Send + Sync {
    /// Insert the banner row and its first version atomically; returns the new id
    async fn insert_banner(&self, banner: &NewBanner, version: &BannerVersion) -> StoreResult<i64>;

    /// Banners for `feature_id` whose tag set contains every tag in `tag_ids`
    ///
    /// Ordered by banner id then version timestamp; paginated.
    async fn get_banners(
        &self,
        tag_ids: &[i64],
        feature_id: i64,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Banner>>;

    /// Banners for `feature_id` whose tag set equals `tag_ids`
    ///
    /// Inactive banners are left out unless `is_admin`. Ordered by banner id
    /// then version creation time.
    async fn get_banner(
        &self,
        tag_ids: &[i64],
        feature_id: i64,
        is_admin: bool,
    ) -> StoreResult<Vec<Banner>>;

    /// Replace the banner attributes and the content of its most recent version
    ///
    /// Returns `false` when no banner has that id.
    async fn update_banner_by_id(
        &self,
        update: &BannerUpdate,
        touched_at: chrono::DateTime<chrono::Utc>,
    ) -> StoreResult<bool>;

    /// Remove the banner and its version history
    ///
    /// Returns `false` when no banner has that id.
    async fn delete_banner_by_id(&self, banner_id: i64) -> StoreResult<bool>;
}
