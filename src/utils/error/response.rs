//! HTTP response handling for errors

use super::types::SyncError;
use crate::core::sync::validation::Violation;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

/// Error body returned by the HTTP adapter
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
    pub timestamp: i64,
}

impl SyncError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            SyncError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            SyncError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            SyncError::BatchNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            SyncError::DuplicateBatchId(_) => (StatusCode::CONFLICT, "DUPLICATE_BATCH"),
            SyncError::NotRetryable { .. } => (StatusCode::CONFLICT, "NOT_RETRYABLE"),
            SyncError::RegistryConflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            SyncError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            SyncError::Downstream(_) | SyncError::HttpClient(_) => {
                (StatusCode::BAD_GATEWAY, "DOWNSTREAM_ERROR")
            }
            SyncError::Queue(_) => (StatusCode::SERVICE_UNAVAILABLE, "QUEUE_UNAVAILABLE"),
            SyncError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            #[cfg(feature = "redis")]
            SyncError::Redis(_) => (StatusCode::INTERNAL_SERVER_ERROR, "REDIS_ERROR"),
            SyncError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            SyncError::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR"),
            SyncError::Alert(_) | SyncError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl ResponseError for SyncError {
    fn status_code(&self) -> StatusCode {
        self.status_and_code().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status, code) = self.status_and_code();

        // Storage details stay in the logs
        let message = match self {
            SyncError::Database(_) => "Database operation failed".to_string(),
            #[cfg(feature = "redis")]
            SyncError::Redis(_) => "Broker operation failed".to_string(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                violations: self.violations().map(<[_]>::to_vec).unwrap_or_default(),
                timestamp: chrono::Utc::now().timestamp(),
            },
        };

        HttpResponse::build(status).json(body)
    }
}
