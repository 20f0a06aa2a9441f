//! Routes of the offline sync API

pub mod health;
pub mod sync;

use crate::utils::error::SyncError;
use actix_web::{HttpRequest, web};
use serde::Serialize;

/// Base path of every route
pub const API_PREFIX: &str = "/api/v1/offline-sync";

/// Header carrying the authenticated caller's email
pub const USER_EMAIL_HEADER: &str = "X-User-Email";

/// Header carrying the caller's comma-separated privileges
pub const USER_PRIVILEGES_HEADER: &str = "X-User-Privileges";

/// Envelope of every successful answer; failures use `ErrorResponse`
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            meta: None,
        }
    }

    /// Success with extra fields such as a result count
    pub fn success_with_meta(data: T, meta: serde_json::Value) -> Self {
        Self {
            success: true,
            data,
            meta: Some(meta),
        }
    }
}

/// Mount every route under [`API_PREFIX`]
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope(API_PREFIX)
            .configure(sync::configure_routes)
            .configure(health::configure_routes),
    );
}

/// Caller email from [`USER_EMAIL_HEADER`]
pub(crate) fn caller_email(req: &HttpRequest) -> Result<String, SyncError> {
    req.headers()
        .get(USER_EMAIL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SyncError::BadRequest(format!("missing {} header", USER_EMAIL_HEADER)))
}

/// Caller privileges from [`USER_PRIVILEGES_HEADER`]; empty when absent
pub(crate) fn caller_privileges(req: &HttpRequest) -> Vec<String> {
    req.headers()
        .get(USER_PRIVILEGES_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
