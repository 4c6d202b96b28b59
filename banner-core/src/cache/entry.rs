//! Cache entry with TTL support

use crate::cache::types::{CacheKey, CacheValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cache entry with its expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cache key
    pub key: CacheKey,

    /// The cached value
    pub value: CacheValue,

    /// When the entry was written
    pub created_at: DateTime<Utc>,

    /// When the entry stops being served
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create a new cache entry that lives for `ttl`
    pub fn new(key: CacheKey, value: CacheValue, ttl: Duration) -> Self {
        let now = Utc::now();
        // A TTL past the representable range never expires
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            key,
            value,
            created_at: now,
            expires_at,
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_cache_entry_creation() {
        let entry = CacheEntry::new(
            "test_key".to_string(),
            "test_value".to_string(),
            Duration::from_secs(300),
        );

        assert_eq!(entry.key, "test_key");
        assert_eq!(entry.value, "test_value");
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(
            "test".to_string(),
            "value".to_string(),
            Duration::from_millis(100),
        );

        assert!(!entry.is_expired());
        sleep(Duration::from_millis(150));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_ttl_beyond_calendar_range() {
        let entry = CacheEntry::new("k".to_string(), "v".to_string(), Duration::MAX);
        assert!(!entry.is_expired());
        assert_eq!(entry.expires_at, DateTime::<Utc>::MAX_UTC);

        let entry = CacheEntry::new(
            "k".to_string(),
            "v".to_string(),
            Duration::from_secs(u64::MAX / 2),
        );
        assert!(!entry.is_expired());
        assert!(entry.expires_at > entry.created_at);
    }
}
