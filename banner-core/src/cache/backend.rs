//! Cache backend trait
//!
//! The banner cache talks to its storage through [`CacheBackend`], so an
//! in-process [`TtlStore`](crate::cache::TtlStore) and a networked cache are
//! interchangeable.

use crate::cache::types::{CacheKey, CacheValue};
use crate::error::CacheError;
use async_trait::async_trait;
use std::time::Duration;

/// Key/value storage with per-entry expiry
///
/// Implementations must treat an expired entry exactly like an absent one.
/// Any `Err` is a transport failure; callers degrade it to a miss.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch the live value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError>;

    /// Store `value` under `key` for `ttl`, replacing any existing entry
    async fn set(&self, key: CacheKey, value: CacheValue, ttl: Duration) -> Result<(), CacheError>;
}
