//! Neo4j connection management
//!
//! This module provides the client the durable banner store runs on, its
//! settings, a health check and schema setup.

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use neo4rs::{query, ConfigBuilder, Graph};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Connection settings for Neo4j
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Neo4jSettings {
    /// Connection URI (e.g., "bolt://localhost:7687")
    pub uri: String,
    /// Username for authentication
    pub user: String,
    /// Password for authentication
    pub password: String,
    /// Database name
    pub database: String,
    /// Connection pool size
    pub max_connections: usize,
    /// Rows fetched per round trip
    pub fetch_size: usize,
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "password".to_string(),
            database: "neo4j".to_string(),
            max_connections: 16,
            fetch_size: 500,
        }
    }
}

impl Neo4jSettings {
    /// Read `NEO4J_URI`, `NEO4J_USER`, `NEO4J_PASSWORD` and `NEO4J_DATABASE`
    ///
    /// A `.env` file is loaded first if present. Unset variables keep their defaults.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::default().with_env_overrides()
    }

    /// Replace fields whose environment variable is set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(uri) = std::env::var("NEO4J_URI") {
            self.uri = uri;
        }
        if let Ok(user) = std::env::var("NEO4J_USER") {
            self.user = user;
        }
        if let Ok(password) = std::env::var("NEO4J_PASSWORD") {
            self.password = password;
        }
        if let Ok(database) = std::env::var("NEO4J_DATABASE") {
            self.database = database;
        }
        self
    }
}

/// Health status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Database is healthy and responsive
    Healthy,
    /// Database is not responsive or erroring
    Unhealthy,
}

impl HealthStatus {
    /// Convert to HTTP status code equivalent
    pub fn to_http_status_code(&self) -> u16 {
        match self {
            HealthStatus::Healthy => 200,
            HealthStatus::Unhealthy => 503,
        }
    }
}

/// Health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub response_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub error: Option<String>,
}

impl HealthCheckResult {
    fn healthy(response_time: Duration) -> Self {
        Self {
            status: HealthStatus::Healthy,
            response_time_ms: response_time.as_millis() as u64,
            timestamp: Utc::now(),
            error: None,
        }
    }

    fn unhealthy(response_time: Duration, error: &str) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            response_time_ms: response_time.as_millis() as u64,
            timestamp: Utc::now(),
            error: Some(error.to_string()),
        }
    }
}

/// Neo4j client with connection pooling
pub struct Neo4jClient {
    graph: Graph,
    settings: Neo4jSettings,
}

impl Neo4jClient {
    /// Connect with the given settings
    ///
    /// # Example
    /// ```no_run
    /// use banner_core::{Neo4jClient, Neo4jSettings};
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let client = Neo4jClient::connect(Neo4jSettings::from_env()).await?;
    ///     client.ensure_schema().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(settings: Neo4jSettings) -> StoreResult<Self> {
        info!(
            "Connecting to Neo4j at {} (database: {})",
            settings.uri, settings.database
        );

        let config = ConfigBuilder::default()
            .uri(settings.uri.as_str())
            .user(settings.user.as_str())
            .password(settings.password.as_str())
            .db(settings.database.as_str())
            .fetch_size(settings.fetch_size)
            .max_connections(settings.max_connections)
            .build()
            .map_err(|e| StoreError::ConfigError(e.to_string()))?;

        let graph = Graph::connect(config)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        info!("Successfully connected to Neo4j");

        Ok(Self { graph, settings })
    }

    /// Simple health check using RETURN 1
    pub async fn health_check(&self) -> StoreResult<bool> {
        debug!("Executing simple health check (RETURN 1)");

        self.graph
            .run(query("RETURN 1"))
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        debug!("Simple health check passed");
        Ok(true)
    }

    /// Health check that never fails, reporting timing and the error if any
    pub async fn health_check_detailed(&self) -> HealthCheckResult {
        let start = Instant::now();

        match self.health_check().await {
            Ok(_) => HealthCheckResult::healthy(start.elapsed()),
            Err(e) => {
                error!("Health check failed: {}", e);
                HealthCheckResult::unhealthy(start.elapsed(), &e.to_string())
            }
        }
    }

    /// Create the constraint and index banner queries rely on
    ///
    /// Safe to run repeatedly.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let statements = [
            "CREATE CONSTRAINT banner_id_unique IF NOT EXISTS \
             FOR (b:Banner) REQUIRE b.banner_id IS UNIQUE",
            "CREATE INDEX banner_feature IF NOT EXISTS FOR (b:Banner) ON (b.feature_id)",
        ];

        for statement in statements {
            self.graph
                .run(query(statement))
                .await
                .map_err(|e| StoreError::QueryError(format!("Failed to set up schema: {}", e)))?;
        }

        info!("Banner schema ready");
        Ok(())
    }

    /// Get a reference to the underlying Neo4j Graph instance
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn settings(&self) -> &Neo4jSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_http_codes() {
        assert_eq!(HealthStatus::Healthy.to_http_status_code(), 200);
        assert_eq!(HealthStatus::Unhealthy.to_http_status_code(), 503);
    }

    #[test]
    fn test_health_check_result_unhealthy() {
        let result = HealthCheckResult::unhealthy(Duration::from_millis(100), "Connection failed");

        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert_eq!(result.response_time_ms, 100);
        assert_eq!(result.error.as_deref(), Some("Connection failed"));
    }

    #[test]
    fn test_health_check_result_healthy() {
        let result = HealthCheckResult::healthy(Duration::from_millis(50));
        assert_eq!(result.status, HealthStatus::Healthy);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_default_settings() {
        let settings = Neo4jSettings::default();
        assert_eq!(settings.uri, "bolt://localhost:7687");
        assert_eq!(settings.database, "neo4j");
        assert_eq!(settings.max_connections, 16);
    }

    #[test]
    fn test_settings_deserialize_partial() {
        let settings: Neo4jSettings =
            serde_json::from_str(r#"{"uri": "bolt://db:7687", "password": "s3cret"}"#).unwrap();
        assert_eq!(settings.uri, "bolt://db:7687");
        assert_eq!(settings.password, "s3cret");
        assert_eq!(settings.user, "neo4j");
    }
}
