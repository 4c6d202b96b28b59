//! Banner node CRUD operations
//!
//! Layout:
//! `(:Banner {banner_id, feature_id, tag_ids, is_active})-[:HAS_VERSION]->(:BannerVersion {content, created_at, updated_at})`.
//! Ids come from a `(:BannerSequence)` counter bumped inside the insert
//! transaction. Tag lists are stored normalized, so `=` on them is set equality.

use crate::error::{StoreError, StoreResult};
use crate::schema::types::{
    format_timestamp, normalize_tags, parse_timestamp, Banner, BannerUpdate, BannerVersion,
    Content, NewBanner,
};
use chrono::{DateTime, Utc};
use neo4rs::{query, Graph, Row, Txn};
use tracing::{debug, warn};

const INSERT_BANNER: &str = "
    MERGE (seq:BannerSequence {name: 'banner'})
      ON CREATE SET seq.value = 0
    SET seq.value = seq.value + 1
    WITH seq.value AS banner_id
    CREATE (b:Banner {
        banner_id: banner_id,
        feature_id: $feature_id,
        tag_ids: $tag_ids,
        is_active: $is_active
    })
    RETURN banner_id";

const INSERT_VERSION: &str = "
    MATCH (b:Banner {banner_id: $banner_id})
    CREATE (b)-[:HAS_VERSION]->(:BannerVersion {
        content: $content,
        created_at: $created_at,
        updated_at: $updated_at
    })";

const SELECT_CONTAINING: &str = "
    MATCH (b:Banner)-[:HAS_VERSION]->(v:BannerVersion)
    WHERE b.feature_id = $feature_id
      AND ALL(tag IN $tag_ids WHERE tag IN b.tag_ids)
    RETURN b.banner_id AS banner_id,
           b.feature_id AS feature_id,
           b.tag_ids AS tag_ids,
           b.is_active AS is_active,
           v.content AS content,
           v.created_at AS created_at,
           v.updated_at AS updated_at
    ORDER BY banner_id, updated_at
    SKIP $offset
    LIMIT $limit";

const SELECT_EXACT: &str = "
    MATCH (b:Banner)-[:HAS_VERSION]->(v:BannerVersion)
    WHERE b.feature_id = $feature_id
      AND b.tag_ids = $tag_ids
      AND ($is_admin OR b.is_active)
    RETURN b.banner_id AS banner_id,
           b.feature_id AS feature_id,
           b.tag_ids AS tag_ids,
           b.is_active AS is_active,
           v.content AS content,
           v.created_at AS created_at,
           v.updated_at AS updated_at
    ORDER BY banner_id, created_at";

const UPDATE_BANNER: &str = "
    MATCH (b:Banner {banner_id: $banner_id})
    SET b.feature_id = $feature_id,
        b.tag_ids = $tag_ids,
        b.is_active = $is_active
    RETURN b.banner_id AS banner_id";

const UPDATE_LATEST_VERSION: &str = "
    MATCH (:Banner {banner_id: $banner_id})-[:HAS_VERSION]->(v:BannerVersion)
    WITH v
    ORDER BY v.updated_at DESC, v.created_at DESC
    LIMIT 1
    SET v.content = $content,
        v.updated_at = $updated_at";

const DELETE_BANNER: &str = "
    MATCH (b:Banner {banner_id: $banner_id})
    OPTIONAL MATCH (b)-[:HAS_VERSION]->(v:BannerVersion)
    WITH b, b.banner_id AS banner_id, collect(v) AS versions
    FOREACH (version IN versions | DETACH DELETE version)
    DETACH DELETE b
    RETURN banner_id";

/// Insert a Banner node and its first version in one transaction
///
/// # Returns
/// * `Ok(id)` - the store-assigned banner id
/// * `Err(StoreError)` naming the step that failed; nothing is committed
pub async fn insert_banner(
    graph: &Graph,
    banner: &NewBanner,
    version: &BannerVersion,
) -> StoreResult<i64> {
    let mut txn = start_txn(graph).await?;

    match insert_steps(&mut txn, banner, version).await {
        Ok(banner_id) => {
            txn.commit().await.map_err(|e| {
                StoreError::QueryError(format!("Failed to commit banner insert: {}", e))
            })?;
            debug!("Inserted banner {}", banner_id);
            Ok(banner_id)
        }
        Err(e) => {
            rollback(txn, "insert_banner").await;
            Err(e)
        }
    }
}

async fn insert_steps(
    txn: &mut Txn,
    banner: &NewBanner,
    version: &BannerVersion,
) -> StoreResult<i64> {
    let cypher = query(INSERT_BANNER)
        .param("feature_id", banner.feature_id)
        .param("tag_ids", normalize_tags(&banner.tag_ids))
        .param("is_active", banner.is_active);

    let mut stream = txn
        .execute(cypher)
        .await
        .map_err(|e| StoreError::QueryError(format!("Failed to insert banner row: {}", e)))?;

    let mut banner_id = None;
    while let Some(row) = stream
        .next(txn.handle())
        .await
        .map_err(|e| StoreError::QueryError(format!("Failed to read banner id: {}", e)))?
    {
        let id: i64 = row
            .get("banner_id")
            .map_err(|e| StoreError::QueryError(format!("Failed to extract banner id: {}", e)))?;
        banner_id = Some(id);
    }
    let banner_id = banner_id
        .ok_or_else(|| StoreError::QueryError("Banner insert returned no id".to_string()))?;

    let cypher = query(INSERT_VERSION)
        .param("banner_id", banner_id)
        .param("content", version.content.as_str())
        .param("created_at", format_timestamp(version.created_at))
        .param("updated_at", format_timestamp(version.updated_at));

    txn.run(cypher)
        .await
        .map_err(|e| StoreError::QueryError(format!("Failed to insert banner version: {}", e)))?;

    Ok(banner_id)
}

/// Banners for a feature whose tag set contains all of `tag_ids`, one row per version
pub async fn get_banners(
    graph: &Graph,
    tag_ids: &[i64],
    feature_id: i64,
    limit: i64,
    offset: i64,
) -> StoreResult<Vec<Banner>> {
    let cypher = query(SELECT_CONTAINING)
        .param("feature_id", feature_id)
        .param("tag_ids", tag_ids.to_vec())
        .param("limit", limit.max(0))
        .param("offset", offset.max(0));

    collect_banners(graph, cypher, "list banners").await
}

/// Banners for a feature whose tag set equals `tag_ids`
///
/// Inactive banners are filtered out unless `is_admin`.
pub async fn get_banner(
    graph: &Graph,
    tag_ids: &[i64],
    feature_id: i64,
    is_admin: bool,
) -> StoreResult<Vec<Banner>> {
    let cypher = query(SELECT_EXACT)
        .param("feature_id", feature_id)
        .param("tag_ids", normalize_tags(tag_ids))
        .param("is_admin", is_admin);

    collect_banners(graph, cypher, "get banner").await
}

/// Update banner attributes and the content of its most recent version
///
/// # Returns
/// * `Ok(true)` if the banner was found and updated
/// * `Ok(false)` if no banner has that id
pub async fn update_banner_by_id(
    graph: &Graph,
    update: &BannerUpdate,
    touched_at: DateTime<Utc>,
) -> StoreResult<bool> {
    let mut txn = start_txn(graph).await?;

    match update_steps(&mut txn, update, touched_at).await {
        Ok(true) => {
            txn.commit().await.map_err(|e| {
                StoreError::QueryError(format!("Failed to commit banner update: {}", e))
            })?;
            debug!("Updated banner {}", update.banner_id);
            Ok(true)
        }
        Ok(false) => {
            rollback(txn, "update_banner_by_id").await;
            Ok(false)
        }
        Err(e) => {
            rollback(txn, "update_banner_by_id").await;
            Err(e)
        }
    }
}

async fn update_steps(
    txn: &mut Txn,
    update: &BannerUpdate,
    touched_at: DateTime<Utc>,
) -> StoreResult<bool> {
    let cypher = query(UPDATE_BANNER)
        .param("banner_id", update.banner_id)
        .param("feature_id", update.feature_id)
        .param("tag_ids", normalize_tags(&update.tag_ids))
        .param("is_active", update.is_active);

    let mut stream = txn
        .execute(cypher)
        .await
        .map_err(|e| StoreError::QueryError(format!("Failed to update banner: {}", e)))?;

    let mut found = false;
    while stream
        .next(txn.handle())
        .await
        .map_err(|e| StoreError::QueryError(format!("Failed to read update result: {}", e)))?
        .is_some()
    {
        found = true;
    }

    if !found {
        return Ok(false);
    }

    let cypher = query(UPDATE_LATEST_VERSION)
        .param("banner_id", update.banner_id)
        .param("content", update.content.as_str())
        .param("updated_at", format_timestamp(touched_at));

    txn.run(cypher)
        .await
        .map_err(|e| StoreError::QueryError(format!("Failed to update banner version: {}", e)))?;

    Ok(true)
}

/// Delete a banner together with its version history
///
/// # Returns
/// * `Ok(true)` if the banner existed
/// * `Ok(false)` if no banner has that id
pub async fn delete_banner_by_id(graph: &Graph, banner_id: i64) -> StoreResult<bool> {
    let cypher = query(DELETE_BANNER).param("banner_id", banner_id);

    let mut result = graph
        .execute(cypher)
        .await
        .map_err(|e| StoreError::QueryError(format!("Failed to delete banner: {}", e)))?;

    let deleted = result
        .next()
        .await
        .map_err(|e| StoreError::QueryError(format!("Failed to read delete result: {}", e)))?
        .is_some();

    Ok(deleted)
}

async fn start_txn(graph: &Graph) -> StoreResult<Txn> {
    graph
        .start_txn()
        .await
        .map_err(|e| StoreError::ConnectionError(format!("Failed to start transaction: {}", e)))
}

async fn rollback(txn: Txn, operation: &str) {
    if let Err(e) = txn.rollback().await {
        warn!("Rollback of {} failed: {}", operation, e);
    }
}

async fn collect_banners(graph: &Graph, cypher: neo4rs::Query, what: &str) -> StoreResult<Vec<Banner>> {
    let mut result = graph
        .execute(cypher)
        .await
        .map_err(|e| StoreError::QueryError(format!("Failed to {}: {}", what, e)))?;

    let mut banners = Vec::new();
    while let Some(row) = result
        .next()
        .await
        .map_err(|e| StoreError::QueryError(format!("Failed to read {} result: {}", what, e)))?
    {
        banners.push(row_to_banner(&row)?);
    }

    Ok(banners)
}

fn row_to_banner(row: &Row) -> StoreResult<Banner> {
    let banner_id: i64 = column(row, "banner_id")?;
    let feature_id: i64 = column(row, "feature_id")?;
    let tag_ids: Vec<i64> = column(row, "tag_ids")?;
    let is_active: bool = column(row, "is_active")?;
    let content: String = column(row, "content")?;
    let created_at: String = column(row, "created_at")?;
    let updated_at: String = column(row, "updated_at")?;

    let version = BannerVersion {
        content: Content::from(content),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    };

    Ok(Banner::from_parts(
        banner_id, tag_ids, feature_id, is_active, version,
    ))
}

fn column<T: serde::de::DeserializeOwned>(row: &Row, name: &str) -> StoreResult<T> {
    row.get(name).map_err(|e| {
        StoreError::SerializationError(format!("Failed to extract banner {}: {}", name, e))
    })
}
