//! Service error type

use crate::core::downstream::DownstreamError;
use crate::core::sync::validation::Violation;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

/// Every failure the pipeline and the API can report
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Registry database
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Redis broker
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Building the downstream HTTP client
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// JSON columns and queue payloads
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Submitted batch failed validation
    #[error("Validation failed: {}", summarize(.0))]
    Validation(Vec<Violation>),

    #[error("Downstream error: {0}")]
    Downstream(#[from] DownstreamError),

    /// A batch with this id already exists
    #[error("Duplicate batch id: {0}")]
    DuplicateBatchId(String),

    /// No batch with this id
    #[error("Batch not found: {0}")]
    BatchNotFound(String),

    /// Retry requested on a batch that is not in a failed state
    #[error("Batch {batch_id} cannot be retried from status {status}")]
    NotRetryable { batch_id: String, status: String },

    /// Concurrent updates kept racing on the same batch
    #[error("Registry conflict on batch {0}")]
    RegistryConflict(String),

    #[error("Queue error: {0}")]
    Queue(String),

    /// A notification channel could not deliver
    #[error("Alert error: {0}")]
    Alert(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Malformed request outside batch validation
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

fn summarize(violations: &[Violation]) -> String {
    match violations {
        [] => "no details".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

impl SyncError {
    pub fn queue(msg: impl Into<String>) -> Self {
        Self::Queue(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Violations carried by a validation error, if any
    pub fn violations(&self) -> Option<&[Violation]> {
        match self {
            Self::Validation(v) => Some(v),
            _ => None,
        }
    }
}
