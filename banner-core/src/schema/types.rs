//! Type definitions for banners and their versions

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BannerError, StoreError, StoreResult};

/// Largest page a list request may ask for
pub const MAX_LIST_LIMIT: i64 = 50;

/// Page size applied when the requested limit is out of range
pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Opaque banner payload
///
/// The engine carries the pre-encoded payload around without looking inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Content(String);

impl Content {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for Content {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for Content {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A banner joined with one of its versions
///
/// This is the shape both store queries return and the shape cached as a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    /// Store-assigned identifier
    pub banner_id: i64,
    /// Tag identifiers the banner is scoped to
    pub tag_ids: Vec<i64>,
    /// Feature the banner belongs to
    pub feature_id: i64,
    /// Payload of the joined version
    pub content: Content,
    /// Inactive banners are only visible to admins
    pub is_active: bool,
    /// When the joined version was created
    pub created_at: DateTime<Utc>,
    /// When the joined version was last touched
    pub updated_at: DateTime<Utc>,
}

impl Banner {
    /// Join banner attributes with a version
    pub fn from_parts(
        banner_id: i64,
        tag_ids: Vec<i64>,
        feature_id: i64,
        is_active: bool,
        version: BannerVersion,
    ) -> Self {
        Self {
            banner_id,
            tag_ids,
            feature_id,
            content: version.content,
            is_active,
            created_at: version.created_at,
            updated_at: version.updated_at,
        }
    }

    /// Pick the current entry out of a set of rows: greatest `updated_at`, then highest id
    pub fn most_recent(banners: Vec<Banner>) -> Option<Banner> {
        banners
            .into_iter()
            .max_by_key(|b| (b.updated_at, b.banner_id))
    }
}

/// One historical content snapshot of a banner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerVersion {
    pub content: Content,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BannerVersion {
    /// Create a first version stamped at `at`
    pub fn new(content: Content, at: DateTime<Utc>) -> Self {
        Self {
            content,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Create request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBanner {
    pub tag_ids: Vec<i64>,
    pub feature_id: i64,
    pub content: Content,
    #[serde(default)]
    pub is_active: bool,
}

impl NewBanner {
    pub fn new(tag_ids: Vec<i64>, feature_id: i64, content: impl Into<Content>) -> Self {
        Self {
            tag_ids,
            feature_id,
            content: content.into(),
            is_active: true,
        }
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Check the submission before it reaches the store
    pub fn validate(&self) -> Result<(), BannerError> {
        validate_scope(&self.tag_ids, self.feature_id)
    }

    /// Snapshot of this request as it looks once stored under `banner_id`
    pub fn to_banner(&self, banner_id: i64, at: DateTime<Utc>) -> Banner {
        Banner::from_parts(
            banner_id,
            self.tag_ids.clone(),
            self.feature_id,
            self.is_active,
            BannerVersion::new(self.content.clone(), at),
        )
    }
}

/// Full replacement of a banner's mutable attributes and current content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerUpdate {
    pub banner_id: i64,
    pub tag_ids: Vec<i64>,
    pub feature_id: i64,
    pub content: Content,
    pub is_active: bool,
}

impl BannerUpdate {
    pub fn validate(&self) -> Result<(), BannerError> {
        validate_scope(&self.tag_ids, self.feature_id)
    }
}

/// List request with containment filter and pagination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BannerFilter {
    pub tag_ids: Vec<i64>,
    pub feature_id: i64,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl BannerFilter {
    pub fn new(tag_ids: Vec<i64>, feature_id: i64) -> Self {
        Self {
            tag_ids,
            feature_id,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }

    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// Bring limit and offset into range
    ///
    /// A limit outside `(0, MAX_LIST_LIMIT]` resets the page to the first
    /// `DEFAULT_LIST_LIMIT` rows. A negative offset alone becomes 0.
    pub fn clamped(mut self) -> Self {
        if self.limit <= 0 || self.limit > MAX_LIST_LIMIT {
            self.limit = DEFAULT_LIST_LIMIT;
            self.offset = 0;
        }
        if self.offset < 0 {
            self.offset = 0;
        }
        self
    }
}

/// Single-banner resolution request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveQuery {
    pub tag_ids: Vec<i64>,
    pub feature_id: i64,
    /// Bypass the cache and read the store
    #[serde(default)]
    pub use_last_revision: bool,
}

impl ResolveQuery {
    pub fn new(tag_ids: Vec<i64>, feature_id: i64) -> Self {
        Self {
            tag_ids,
            feature_id,
            use_last_revision: false,
        }
    }

    pub fn last_revision(mut self, use_last_revision: bool) -> Self {
        self.use_last_revision = use_last_revision;
        self
    }
}

fn validate_scope(tag_ids: &[i64], feature_id: i64) -> Result<(), BannerError> {
    if tag_ids.is_empty() {
        return Err(BannerError::ValidationFailed(
            "tag_ids cannot be empty".to_string(),
        ));
    }

    if feature_id < 0 {
        return Err(BannerError::ValidationFailed(
            "feature_id must be a non-negative integer".to_string(),
        ));
    }

    Ok(())
}

/// Tag sets are persisted sorted and deduplicated so equality is set equality
pub fn normalize_tags(tag_ids: &[i64]) -> Vec<i64> {
    let mut tags = tag_ids.to_vec();
    tags.sort_unstable();
    tags.dedup();
    tags
}

/// Fixed-width RFC 3339, so stored strings sort chronologically
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::SerializationError(format!("invalid timestamp {}: {}", raw, e)))
}
