//! Batch submission, status and retry endpoints

use super::{ApiResponse, caller_email, caller_privileges};
use crate::core::sync::{PointageRecords, StandardPointage, SubmitBatch, TerrainPointage};
use crate::server::state::AppState;
use crate::utils::error::SyncError;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use tracing::debug;

/// Configure batch routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/pointages/sync", web::post().to(sync_standard))
        .route("/pointages/terrain/sync", web::post().to(sync_terrain))
        .route("/status/{batch_id}", web::get().to(batch_status))
        .route("/failures", web::get().to(list_failures))
        .route("/retry/{batch_id}", web::post().to(retry_batch));
}

#[derive(Debug, Deserialize)]
pub struct StandardSyncRequest {
    #[serde(default)]
    pub pointages: Vec<StandardPointage>,
}

#[derive(Debug, Deserialize)]
pub struct TerrainSyncRequest {
    #[serde(default)]
    pub pointages: Vec<TerrainPointage>,
}

async fn sync_standard(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<StandardSyncRequest>,
) -> Result<HttpResponse, SyncError> {
    let email = caller_email(&req)?;
    debug!(email = %email, count = body.pointages.len(), "Standard batch received");

    let response = state
        .service
        .submit(SubmitBatch {
            email,
            records: PointageRecords::Standard(body.into_inner().pointages),
            privileges: caller_privileges(&req),
        })
        .await?;

    Ok(HttpResponse::Accepted().json(ApiResponse::success(response)))
}

async fn sync_terrain(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<TerrainSyncRequest>,
) -> Result<HttpResponse, SyncError> {
    let email = caller_email(&req)?;
    debug!(email = %email, count = body.pointages.len(), "Terrain batch received");

    let response = state
        .service
        .submit(SubmitBatch {
            email,
            records: PointageRecords::Terrain(body.into_inner().pointages),
            privileges: caller_privileges(&req),
        })
        .await?;

    Ok(HttpResponse::Accepted().json(ApiResponse::success(response)))
}

async fn batch_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, SyncError> {
    let view = state.service.status(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
}

async fn list_failures(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, SyncError> {
    let email = caller_email(&req)?;
    let failures = state.service.failures(&email).await?;
    let count = failures.len();

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_meta(
        failures,
        serde_json::json!({ "count": count }),
    )))
}

async fn retry_batch(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, SyncError> {
    let response = state.service.retry(&path.into_inner()).await?;
    Ok(HttpResponse::Accepted().json(ApiResponse::success(response)))
}
