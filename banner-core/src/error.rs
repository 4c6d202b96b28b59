//! Error types for banner operations
//!
//! Three layers of errors live here:
//! - [`StoreError`]: failures talking to the durable store
//! - [`CacheError`]: cache-layer outcomes, never surfaced past the resolver
//! - [`BannerError`]: what the resolver returns to the boundary

use thiserror::Error;

/// Errors raised by the durable banner store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection error - network or connection pool issues
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Query execution error
    #[error("Query error: {0}")]
    QueryError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A persisted value could not be decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Neo4rs driver error (wrapper)
    #[error("Neo4rs driver error: {0}")]
    DriverError(#[from] neo4rs::Error),
}

/// Cache-layer outcomes
///
/// None of these are fatal: the resolver logs them and answers from the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key absent or expired
    #[error("cache miss for key {0}")]
    Miss(String),

    /// Entry present but not decodable as a banner
    #[error("cached entry for key {key} could not be decoded: {reason}")]
    Decode { key: String, reason: String },

    /// Banner snapshot could not be encoded for storage
    #[error("banner snapshot could not be encoded: {0}")]
    Serialization(String),

    /// Transport failure talking to the cache backend
    #[error("cache backend error: {0}")]
    Backend(String),
}

impl CacheError {
    /// True for an absent or expired key
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Miss(_))
    }
}

/// Errors returned by the resolver to its caller
#[derive(Error, Debug)]
pub enum BannerError {
    /// No role token was presented
    #[error("user not authorized")]
    AuthenticationMissing,

    /// A role was presented but it does not grant the operation
    #[error("user not allowed")]
    AuthorizationDenied,

    /// Malformed or incomplete banner submission
    #[error("incorrect banner data: {0}")]
    ValidationFailed(String),

    /// The banner addressed by id does not exist
    #[error("banner {0} not found")]
    NotFound(i64),

    /// The durable store failed while running `operation`
    #[error("store operation {operation} failed: {source}")]
    StoreFailure {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// The caller cancelled the request
    #[error("request cancelled during {0}")]
    Cancelled(&'static str),

    /// The caller's deadline passed
    #[error("deadline exceeded during {0}")]
    DeadlineExceeded(&'static str),
}

impl BannerError {
    /// Wrap a store error with the name of the failing operation
    pub fn store(operation: &'static str, source: StoreError) -> Self {
        BannerError::StoreFailure { operation, source }
    }

    /// Convert to HTTP status code equivalent
    pub fn status_code(&self) -> u16 {
        match self {
            BannerError::AuthenticationMissing => 401,
            BannerError::AuthorizationDenied => 403,
            BannerError::ValidationFailed(_) => 400,
            BannerError::NotFound(_) => 404,
            BannerError::StoreFailure { .. } => 500,
            BannerError::Cancelled(_) => 499,
            BannerError::DeadlineExceeded(_) => 504,
        }
    }

    /// True when the caller can fix the request
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Message safe to show at the boundary
    ///
    /// Store failures are reported generically; their details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            BannerError::StoreFailure { .. } => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for resolver operations
pub type Result<T> = std::result::Result<T, BannerError>;
