//! Configuration for the banner cache

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Time-to-live of a cached banner snapshot
pub const DEFAULT_BANNER_TTL: Duration = Duration::from_secs(5 * 60);

/// Longest TTL a configuration may ask for
pub const MAX_BANNER_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// How often writes and reads sweep out expired entries
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// How tag ids are arranged when deriving a cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// Sort and deduplicate tag ids, so any ordering of the same set shares a key
    #[default]
    Sorted,
    /// Keep tag ids in the order the caller gave them
    ///
    /// The same tag set in two orders produces two keys that miss each other.
    CallerOrder,
}

/// Configuration for the banner cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live for cache entries
    #[serde(with = "duration_secs")]
    pub default_ttl: Duration,

    /// TTL jitter factor (0.0 - 1.0)
    /// Zero keeps the TTL fixed
    pub ttl_jitter: f64,

    /// Tag ordering used for key derivation
    pub key_strategy: KeyStrategy,

    /// Minimum time between sweeps of expired entries
    #[serde(with = "duration_secs")]
    pub cleanup_interval: Duration,

    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_BANNER_TTL,
            ttl_jitter: 0.0,
            key_strategy: KeyStrategy::Sorted,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            enable_metrics: true,
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.default_ttl.is_zero() {
            return Err("default_ttl must be greater than 0".to_string());
        }

        if self.default_ttl > MAX_BANNER_TTL {
            return Err(format!(
                "default_ttl must be at most {} seconds",
                MAX_BANNER_TTL.as_secs()
            ));
        }

        if self.cleanup_interval.is_zero() {
            return Err("cleanup_interval must be greater than 0".to_string());
        }

        if self.ttl_jitter < 0.0 || self.ttl_jitter > 1.0 {
            return Err("ttl_jitter must be between 0.0 and 1.0".to_string());
        }

        Ok(())
    }

    /// Calculate actual TTL with jitter applied
    pub fn ttl_with_jitter(&self) -> Duration {
        if self.ttl_jitter == 0.0 {
            return self.default_ttl;
        }

        let base_secs = self.default_ttl.as_secs_f64();
        let jitter_range = base_secs * self.ttl_jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;
        let final_secs = (base_secs + jitter).max(0.001);

        Duration::try_from_secs_f64(final_secs).unwrap_or(self.default_ttl)
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    default_ttl: Option<Duration>,
    ttl_jitter: Option<f64>,
    key_strategy: Option<KeyStrategy>,
    cleanup_interval: Option<Duration>,
    enable_metrics: Option<bool>,
}

impl CacheConfigBuilder {
    /// Set default TTL for cache entries
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Set TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    /// Set the tag ordering used for key derivation
    pub fn key_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.key_strategy = Some(strategy);
        self
    }

    /// Set the minimum time between expired-entry sweeps
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Enable or disable metrics collection
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = Some(enable);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            default_ttl: self.default_ttl.unwrap_or(defaults.default_ttl),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
            key_strategy: self.key_strategy.unwrap_or(defaults.key_strategy),
            cleanup_interval: self.cleanup_interval.unwrap_or(defaults.cleanup_interval),
            enable_metrics: self.enable_metrics.unwrap_or(defaults.enable_metrics),
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom("duration must be a non-negative number of seconds")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert_eq!(config.ttl_jitter, 0.0);
        assert_eq!(config.key_strategy, KeyStrategy::Sorted);
        assert_eq!(config.cleanup_interval, DEFAULT_CLEANUP_INTERVAL);
        assert_eq!(config.ttl_with_jitter(), Duration::from_secs(300));
    }

    #[test]
    fn test_config_validation() {
        assert!(CacheConfig::default().validate().is_ok());

        let invalid = CacheConfig::builder().default_ttl(Duration::ZERO).build();
        assert!(invalid.validate().is_err());

        let invalid = CacheConfig::builder().ttl_jitter(1.5).build();
        assert!(invalid.validate().is_err());

        let invalid = CacheConfig::builder()
            .cleanup_interval(Duration::ZERO)
            .build();
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_ttl_upper_bound() {
        let at_limit = CacheConfig::builder().default_ttl(MAX_BANNER_TTL).build();
        assert!(at_limit.validate().is_ok());

        let too_long = CacheConfig::builder()
            .default_ttl(MAX_BANNER_TTL + Duration::from_secs(1))
            .build();
        assert!(too_long.validate().is_err());

        let overflowing = CacheConfig::builder()
            .default_ttl(Duration::from_secs(u64::MAX))
            .build();
        assert!(overflowing.validate().is_err());
    }

    #[test]
    fn test_jitter_on_huge_ttl_does_not_panic() {
        let config = CacheConfig::builder()
            .default_ttl(Duration::MAX)
            .ttl_jitter(1.0)
            .build();
        let _ = config.ttl_with_jitter();
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::builder()
            .default_ttl(Duration::from_secs(600))
            .key_strategy(KeyStrategy::CallerOrder)
            .enable_metrics(false)
            .build();

        assert_eq!(config.default_ttl, Duration::from_secs(600));
        assert_eq!(config.key_strategy, KeyStrategy::CallerOrder);
        assert!(!config.enable_metrics);
    }

    #[test]
    fn test_ttl_with_jitter() {
        let config = CacheConfig::builder()
            .default_ttl(Duration::from_secs(3600))
            .ttl_jitter(0.1)
            .build();

        let ttl = config.ttl_with_jitter();
        assert!(ttl.as_secs_f64() >= 3600.0 - 360.0);
        assert!(ttl.as_secs_f64() <= 3600.0 + 360.0);
    }

    #[test]
    fn test_deserialize_from_seconds() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"default_ttl": 30, "key_strategy": "caller_order"}"#).unwrap();
        assert_eq!(config.default_ttl, Duration::from_secs(30));
        assert_eq!(config.key_strategy, KeyStrategy::CallerOrder);
        assert!(config.enable_metrics);

        let negative: Result<CacheConfig, _> = serde_json::from_str(r#"{"default_ttl": -1}"#);
        assert!(negative.is_err());

        let huge: Result<CacheConfig, _> = serde_json::from_str(r#"{"default_ttl": 1e30}"#);
        assert!(huge.is_err());

        let config: CacheConfig = serde_json::from_str(r#"{"cleanup_interval": 0.5}"#).unwrap();
        assert_eq!(config.cleanup_interval, Duration::from_millis(500));
    }
}
