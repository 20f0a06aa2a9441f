//! Health and metrics endpoints

use super::ApiResponse;
use crate::monitoring::MetricsSnapshot;
use crate::monitoring::alerts::AlertStats;
use crate::server::state::AppState;
use actix_web::{HttpResponse, Result as ActixResult, web};
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Configure health check routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(metrics));
}

/// Health report
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: Cow<'static, str>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: Cow<'static, str>,
    pub registry: bool,
    /// Messages waiting, when the broker can tell
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_depth: Option<u64>,
    pub batches: BTreeMap<String, u64>,
}

/// Metrics report
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub pipeline: MetricsSnapshot,
    pub alerts: AlertStats,
}

/// Registry and broker health
///
/// Answers 503 when the registry does not respond.
pub async fn health_check(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    debug!("Health check requested");

    let registry = match state.registry.health_check().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Registry health check failed");
            false
        }
    };

    let queue_depth = state.queue.depth().await.unwrap_or_else(|e| {
        warn!(error = %e, "Queue depth unavailable");
        None
    });

    let batches = if registry {
        state
            .registry
            .count_by_status()
            .await
            .map(|counts| {
                counts
                    .into_iter()
                    .map(|(status, n)| (status.to_string(), n))
                    .collect()
            })
            .unwrap_or_default()
    } else {
        BTreeMap::new()
    };

    let health = HealthStatus {
        status: Cow::Borrowed(if registry { "healthy" } else { "degraded" }),
        timestamp: chrono::Utc::now(),
        version: Cow::Borrowed(env!("CARGO_PKG_VERSION")),
        registry,
        queue_depth,
        batches,
    };

    let mut response = if registry {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    Ok(response.json(ApiResponse::success(health)))
}

async fn metrics(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let report = MetricsReport {
        pipeline: state.metrics.snapshot(),
        alerts: state.alerts.stats(),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(report)))
}
