//! In-memory banner store
//!
//! Same semantics as the Neo4j store, held in a `BTreeMap` behind a tokio
//! `RwLock`. Every write takes the lock once, so multi-step writes are atomic.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::BannerStore;
use crate::error::StoreResult;
use crate::schema::{normalize_tags, Banner, BannerUpdate, BannerVersion, NewBanner};

#[derive(Debug, Clone)]
struct StoredBanner {
    feature_id: i64,
    tag_ids: Vec<i64>,
    is_active: bool,
    versions: Vec<BannerVersion>,
}

impl StoredBanner {
    /// One row per version, ordered by `order`
    ///
    /// Listing orders versions by `updated_at`, exact match by `created_at`,
    /// the same as the Cypher queries.
    fn rows<K: Ord>(&self, banner_id: i64, order: impl Fn(&BannerVersion) -> K) -> Vec<Banner> {
        let mut versions: Vec<&BannerVersion> = self.versions.iter().collect();
        versions.sort_by_key(|v| order(v));
        versions
            .into_iter()
            .map(|v| {
                Banner::from_parts(
                    banner_id,
                    self.tag_ids.clone(),
                    self.feature_id,
                    self.is_active,
                    v.clone(),
                )
            })
            .collect()
    }

    fn contains_all(&self, tag_ids: &[i64]) -> bool {
        tag_ids.iter().all(|t| self.tag_ids.binary_search(t).is_ok())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    last_id: i64,
    banners: BTreeMap<i64, StoredBanner>,
}

/// Banner store kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryBannerStore {
    state: RwLock<MemoryState>,
}

impl InMemoryBannerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of banners currently stored
    pub async fn len(&self) -> usize {
        self.state.read().await.banners.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.banners.is_empty()
    }

    /// Version history of a banner, or `None` if it does not exist
    pub async fn versions(&self, banner_id: i64) -> Option<Vec<BannerVersion>> {
        self.state
            .read()
            .await
            .banners
            .get(&banner_id)
            .map(|b| b.versions.clone())
    }
}

fn page(rows: Vec<Banner>, limit: i64, offset: i64) -> Vec<Banner> {
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl BannerStore for InMemoryBannerStore {
    async fn insert_banner(&self, banner: &NewBanner, version: &BannerVersion) -> StoreResult<i64> {
        let mut state = self.state.write().await;

        state.last_id += 1;
        let banner_id = state.last_id;
        state.banners.insert(
            banner_id,
            StoredBanner {
                feature_id: banner.feature_id,
                tag_ids: normalize_tags(&banner.tag_ids),
                is_active: banner.is_active,
                versions: vec![version.clone()],
            },
        );

        debug!("Inserted banner {} in memory", banner_id);
        Ok(banner_id)
    }

    async fn get_banners(
        &self,
        tag_ids: &[i64],
        feature_id: i64,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Banner>> {
        let state = self.state.read().await;

        let rows: Vec<Banner> = state
            .banners
            .iter()
            .filter(|(_, b)| b.feature_id == feature_id && b.contains_all(tag_ids))
            .flat_map(|(id, b)| b.rows(*id, |v| v.updated_at))
            .collect();

        Ok(page(rows, limit, offset))
    }

    async fn get_banner(
        &self,
        tag_ids: &[i64],
        feature_id: i64,
        is_admin: bool,
    ) -> StoreResult<Vec<Banner>> {
        let wanted = normalize_tags(tag_ids);
        let state = self.state.read().await;

        Ok(state
            .banners
            .iter()
            .filter(|(_, b)| b.feature_id == feature_id && b.tag_ids == wanted)
            .filter(|(_, b)| is_admin || b.is_active)
            .flat_map(|(id, b)| b.rows(*id, |v| v.created_at))
            .collect())
    }

    async fn update_banner_by_id(
        &self,
        update: &BannerUpdate,
        touched_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;

        let Some(stored) = state.banners.get_mut(&update.banner_id) else {
            return Ok(false);
        };

        stored.feature_id = update.feature_id;
        stored.tag_ids = normalize_tags(&update.tag_ids);
        stored.is_active = update.is_active;

        match stored.versions.iter_mut().max_by_key(|v| v.updated_at) {
            Some(current) => {
                current.content = update.content.clone();
                current.updated_at = touched_at;
            }
            None => stored
                .versions
                .push(BannerVersion::new(update.content.clone(), touched_at)),
        }

        debug!("Updated banner {} in memory", update.banner_id);
        Ok(true)
    }

    async fn delete_banner_by_id(&self, banner_id: i64) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(state.banners.remove(&banner_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Content;
    use chrono::Duration;

    async fn insert(store: &InMemoryBannerStore, tags: Vec<i64>, feature: i64, content: &str) -> i64 {
        let banner = NewBanner::new(tags, feature, content);
        let version = BannerVersion::new(banner.content.clone(), Utc::now());
        store.insert_banner(&banner, &version).await.unwrap()
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = InMemoryBannerStore::new();
        assert_eq!(insert(&store, vec![1], 1, "a").await, 1);
        assert_eq!(insert(&store, vec![1], 1, "b").await, 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_exact_match_ignores_tag_order() {
        let store = InMemoryBannerStore::new();
        insert(&store, vec![2, 1], 10, "a").await;
        insert(&store, vec![1, 2, 3], 10, "b").await;

        let rows = store.get_banner(&[1, 2], 10, true).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].content, Content::from("a"));
        assert_eq!(rows[0].tag_ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_containment() {
        let store = InMemoryBannerStore::new();
        insert(&store, vec![1, 2], 10, "a").await;
        insert(&store, vec![1, 2, 3], 10, "b").await;
        insert(&store, vec![1], 10, "c").await;
        insert(&store, vec![1, 2], 11, "d").await;

        let rows = store.get_banners(&[1, 2], 10, 10, 0).await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|b| b.banner_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_pagination() {
        let store = InMemoryBannerStore::new();
        for i in 0..5 {
            insert(&store, vec![1], 1, &format!("{}", i)).await;
        }

        let rows = store.get_banners(&[1], 1, 2, 2).await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|b| b.banner_id).collect();
        assert_eq!(ids, vec![3, 4]);
    }

    #[tokio::test]
    async fn test_inactive_hidden_from_users() {
        let store = InMemoryBannerStore::new();
        let banner = NewBanner::new(vec![1], 1, "hidden").with_active(false);
        let version = BannerVersion::new(banner.content.clone(), Utc::now());
        store.insert_banner(&banner, &version).await.unwrap();

        assert!(store.get_banner(&[1], 1, false).await.unwrap().is_empty());
        assert_eq!(store.get_banner(&[1], 1, true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_touches_latest_version_in_place() {
        let store = InMemoryBannerStore::new();
        let id = insert(&store, vec![1], 1, "old").await;

        let update = BannerUpdate {
            banner_id: id,
            tag_ids: vec![4, 1],
            feature_id: 2,
            content: Content::from("new"),
            is_active: false,
        };
        let touched = Utc::now() + Duration::seconds(1);
        assert!(store.update_banner_by_id(&update, touched).await.unwrap());

        let versions = store.versions(id).await.unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].content, Content::from("new"));
        assert_eq!(versions[0].updated_at, touched);

        let rows = store.get_banner(&[1, 4], 2, true).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_active);
    }

    #[tokio::test]
    async fn test_update_missing_banner() {
        let store = InMemoryBannerStore::new();
        let update = BannerUpdate {
            banner_id: 99,
            tag_ids: vec![1],
            feature_id: 1,
            content: Content::from("x"),
            is_active: true,
        };
        assert!(!store.update_banner_by_id(&update, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_history() {
        let store = InMemoryBannerStore::new();
        let id = insert(&store, vec![1], 1, "a").await;

        assert!(store.delete_banner_by_id(id).await.unwrap());
        assert!(store.versions(id).await.is_none());
        assert!(store.get_banners(&[1], 1, 10, 0).await.unwrap().is_empty());
        assert!(!store.delete_banner_by_id(id).await.unwrap());
    }

    #[tokio::test]
    async fn test_version_order_matches_query() {
        let store = InMemoryBannerStore::new();
        let id = insert(&store, vec![1], 1, "first").await;

        // A second version created later but last touched earlier than the first
        let first = store.versions(id).await.unwrap()[0].clone();
        let second = BannerVersion {
            content: Content::from("second"),
            created_at: first.created_at + Duration::seconds(10),
            updated_at: first.updated_at - Duration::seconds(10),
        };
        store
            .state
            .write()
            .await
            .banners
            .get_mut(&id)
            .unwrap()
            .versions
            .push(second);

        let listed = store.get_banners(&[1], 1, 10, 0).await.unwrap();
        let listed: Vec<&str> = listed.iter().map(|b| b.content.as_str()).collect();
        assert_eq!(listed, vec!["second", "first"]);

        let exact = store.get_banner(&[1], 1, true).await.unwrap();
        let exact: Vec<&str> = exact.iter().map(|b| b.content.as_str()).collect();
        assert_eq!(exact, vec!["first", "second"]);
    }
}
