//! Neo4j-backed banner store

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::BannerStore;
use crate::connection::Neo4jClient;
use crate::error::StoreResult;
use crate::schema::{self, Banner, BannerUpdate, BannerVersion, NewBanner};

/// Banner store on a shared Neo4j connection pool
#[derive(Clone)]
pub struct Neo4jBannerStore {
    client: Arc<Neo4jClient>,
}

impl Neo4jBannerStore {
    pub fn new(client: Arc<Neo4jClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Neo4jClient {
        &self.client
    }
}

#[async_trait]
impl BannerStore for Neo4jBannerStore {
    async fn insert_banner(&self, banner: &NewBanner, version: &BannerVersion) -> StoreResult<i64> {
        schema::insert_banner(self.client.graph(), banner, version).await
    }

    async fn get_banners(
        &self,
        tag_ids: &[i64],
        feature_id: i64,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Banner>> {
        schema::get_banners(self.client.graph(), tag_ids, feature_id, limit, offset).await
    }

    async fn get_banner(
        &self,
        tag_ids: &[i64],
        feature_id: i64,
        is_admin: bool,
    ) -> StoreResult<Vec<Banner>> {
        schema::get_banner(self.client.graph(), tag_ids, feature_id, is_admin).await
    }

    async fn update_banner_by_id(
        &self,
        update: &BannerUpdate,
        touched_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        schema::update_banner_by_id(self.client.graph(), update, touched_at).await
    }

    async fn delete_banner_by_id(&self, banner_id: i64) -> StoreResult<bool> {
        schema::delete_banner_by_id(self.client.graph(), banner_id).await
    }
}
