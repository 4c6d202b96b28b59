//! Application configuration
//!
//! Loaded from an optional YAML file, then overridden from the environment:
//!
//! ```yaml
//! store: neo4j            # or "memory"
//! request_timeout_ms: 2000
//! neo4j:
//!   uri: bolt://localhost:7687
//!   user: neo4j
//!   password: password
//! cache:
//!   default_ttl: 300
//!   key_strategy: sorted  # or "caller_order"
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use banner_core::{CacheConfig, Neo4jSettings};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which banner store backs the resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Neo4j,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreKind,
    /// Deadline applied to every request; none if unset
    pub request_timeout_ms: Option<u64>,
    pub neo4j: Neo4jSettings,
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration from `path`
    ///
    /// A missing file is only an error when `required`; otherwise defaults are
    /// used. Environment overrides are applied either way.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        dotenv::dotenv().ok();

        let config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {:?}", path))?;
            debug!("Loaded config from {:?}", path);
            Self::from_yaml(&raw).with_context(|| format!("Invalid config file {:?}", path))?
        } else if required {
            return Err(anyhow!("Config file {:?} not found", path));
        } else {
            Self::default()
        };

        let config = config.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        // An empty file deserializes as null
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply `NEO4J_*`, `BANNER_STORE`, `BANNER_CACHE_TTL_SECS` and `BANNER_REQUEST_TIMEOUT_MS`
    pub fn with_env_overrides(mut self) -> Result<Self> {
        self.neo4j = self.neo4j.with_env_overrides();

        if let Ok(store) = std::env::var("BANNER_STORE") {
            self.store = match store.to_ascii_lowercase().as_str() {
                "neo4j" => StoreKind::Neo4j,
                "memory" => StoreKind::Memory,
                other => return Err(anyhow!("Unknown BANNER_STORE value: {}", other)),
            };
        }

        if let Ok(ttl) = std::env::var("BANNER_CACHE_TTL_SECS") {
            let secs: u64 = ttl
                .parse()
                .with_context(|| format!("Invalid BANNER_CACHE_TTL_SECS: {}", ttl))?;
            self.cache.default_ttl = Duration::from_secs(secs);
        }

        if let Ok(timeout) = std::env::var("BANNER_REQUEST_TIMEOUT_MS") {
            let ms: u64 = timeout
                .parse()
                .with_context(|| format!("Invalid BANNER_REQUEST_TIMEOUT_MS: {}", timeout))?;
            self.request_timeout_ms = Some(ms);
        }

        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        self.cache
            .validate()
            .map_err(|e| anyhow!("Invalid cache config: {}", e))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}
