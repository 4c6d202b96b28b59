//! Operation runner
//!
//! Turns command-line and batch requests into resolver calls and renders the
//! outcome as JSON. Tokens are mapped to roles here, at the boundary.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use banner_core::{
    authorize, Access, BannerCache, BannerError, BannerFilter, BannerStore, BannerUpdate,
    CacheStats, HealthCheckResult, InMemoryBannerStore, Neo4jBannerStore, Neo4jClient, NewBanner,
    RequestContext, ResolveQuery, Resolver, StoreError, TtlStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::{AppConfig, StoreKind};

/// One request against the resolver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Create {
        tag_ids: Vec<i64>,
        feature_id: i64,
        content: Value,
        #[serde(default = "default_active")]
        is_active: bool,
    },
    List {
        tag_ids: Vec<i64>,
        feature_id: i64,
        #[serde(default)]
        limit: i64,
        #[serde(default)]
        offset: i64,
    },
    Resolve {
        tag_ids: Vec<i64>,
        feature_id: i64,
        #[serde(default)]
        use_last_revision: bool,
    },
    Update {
        banner_id: i64,
        tag_ids: Vec<i64>,
        feature_id: i64,
        content: Value,
        #[serde(default = "default_active")]
        is_active: bool,
    },
    Delete {
        banner_id: i64,
    },
}

fn default_active() -> bool {
    true
}

impl Operation {
    pub fn access(&self) -> Access {
        match self {
            Operation::Resolve { .. } => Access::AnyRole,
            _ => Access::AdminOnly,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Create { .. } => "create",
            Operation::List { .. } => "list",
            Operation::Resolve { .. } => "resolve",
            Operation::Update { .. } => "update",
            Operation::Delete { .. } => "delete",
        }
    }
}

/// A batch step: an operation and, optionally, the token to run it with
#[derive(Debug, Clone, Deserialize)]
pub struct BatchStep {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(flatten)]
    pub operation: Operation,
}

/// Sequence of operations run against one resolver
#[derive(Debug, Clone, Deserialize)]
pub struct BatchFile {
    /// Token for steps that do not name their own
    #[serde(default)]
    pub token: Option<String>,
    pub steps: Vec<BatchStep>,
}

impl BatchFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file {:?}", path))?;
        serde_yaml::from_str(&raw).with_context(|| format!("Invalid batch file {:?}", path))
    }
}

/// Content is opaque to the engine; strings pass through, anything else is stored as JSON
fn content_of(value: &Value) -> String {
    match value {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

/// Render a resolver outcome the way it is printed
pub fn render(outcome: &std::result::Result<Value, BannerError>) -> Value {
    match outcome {
        Ok(value) => value.clone(),
        Err(e) => json!({ "error": e.public_message(), "status": e.status_code() }),
    }
}

/// Health check outcome with the HTTP status a probe endpoint would answer
pub fn health_report(result: &HealthCheckResult) -> Result<Value> {
    Ok(json!({
        "http_status": result.status.to_http_status_code(),
        "health": serde_json::to_value(result)?,
    }))
}

fn to_json<T: Serialize>(value: &T) -> std::result::Result<Value, BannerError> {
    serde_json::to_value(value).map_err(|e| {
        BannerError::store("encode_response", StoreError::SerializationError(e.to_string()))
    })
}

/// Runs operations against a single resolver
#[derive(Clone)]
pub struct OperationRunner {
    resolver: Resolver,
    cache_store: TtlStore,
    request_timeout: Option<std::time::Duration>,
}

impl OperationRunner {
    /// `cache_store` must be the store behind the resolver's cache
    pub fn new(resolver: Resolver, cache_store: TtlStore, config: &AppConfig) -> Self {
        Self {
            resolver,
            cache_store,
            request_timeout: config.request_timeout(),
        }
    }

    /// Build the resolver the configuration describes
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let store: Arc<dyn BannerStore> = match config.store {
            StoreKind::Memory => {
                info!("Using in-memory banner store");
                Arc::new(InMemoryBannerStore::new())
            }
            StoreKind::Neo4j => {
                let client = Neo4jClient::connect(config.neo4j.clone()).await?;
                Arc::new(Neo4jBannerStore::new(Arc::new(client)))
            }
        };

        let cache_store = TtlStore::new(config.cache.clone());
        let cache = BannerCache::new(Arc::new(cache_store.clone()), config.cache.clone());

        Ok(Self::new(Resolver::new(store, cache), cache_store, config))
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache_store.stats().await
    }

    fn context(&self) -> RequestContext {
        let ctx = RequestContext::new();
        match self.request_timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }

    /// Authorize `token` for the operation and run it
    pub async fn execute(
        &self,
        token: Option<&str>,
        operation: &Operation,
    ) -> std::result::Result<Value, BannerError> {
        let role = authorize(token, operation.access())?;
        let ctx = self.context();
        debug!(
            request_id = %ctx.request_id(),
            "Running {} as {}", operation.name(), role.as_str()
        );

        match operation {
            Operation::Create {
                tag_ids,
                feature_id,
                content,
                is_active,
            } => {
                let banner = NewBanner::new(tag_ids.clone(), *feature_id, content_of(content))
                    .with_active(*is_active);
                let banner_id = self.resolver.create_banner(&ctx, role, &banner).await?;
                Ok(json!({ "banner_id": banner_id }))
            }
            Operation::List {
                tag_ids,
                feature_id,
                limit,
                offset,
            } => {
                let filter = BannerFilter::new(tag_ids.clone(), *feature_id).page(*limit, *offset);
                to_json(&self.resolver.list_banners(&ctx, role, filter).await?)
            }
            Operation::Resolve {
                tag_ids,
                feature_id,
                use_last_revision,
            } => {
                let query =
                    ResolveQuery::new(tag_ids.clone(), *feature_id).last_revision(*use_last_revision);
                to_json(&self.resolver.resolve_banner(&ctx, role, &query).await?)
            }
            Operation::Update {
                banner_id,
                tag_ids,
                feature_id,
                content,
                is_active,
            } => {
                let update = BannerUpdate {
                    banner_id: *banner_id,
                    tag_ids: tag_ids.clone(),
                    feature_id: *feature_id,
                    content: content_of(content).into(),
                    is_active: *is_active,
                };
                self.resolver.update_banner(&ctx, role, &update).await?;
                Ok(json!({ "banner_id": banner_id, "status": 200 }))
            }
            Operation::Delete { banner_id } => {
                self.resolver.delete_banner(&ctx, role, *banner_id).await?;
                Ok(json!({ "banner_id": banner_id, "status": 204 }))
            }
        }
    }

    /// Run every step in order, collecting one rendered result per step
    ///
    /// A failing step does not stop the batch.
    pub async fn run_batch(&self, batch: &BatchFile, default_token: Option<&str>) -> Vec<Value> {
        let mut results = Vec::with_capacity(batch.steps.len());

        for (i, step) in batch.steps.iter().enumerate() {
            let token = step
                .token
                .as_deref()
                .or(batch.token.as_deref())
                .or(default_token);
            let outcome = self.execute(token, &step.operation).await;
            debug!("Batch step {} ({}) done", i, step.operation.name());
            results.push(render(&outcome));
        }

        info!("Batch of {} steps finished: {}", results.len(), self.cache_stats().await);
        results
    }
}
