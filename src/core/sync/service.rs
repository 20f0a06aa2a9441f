//! Ingress operations: submit, status, failures, retry

use super::aggregation::failed_positions;
use super::transition::BatchTransition;
use super::types::{Batch, BatchKind, DispatchMessage, PointageRecords, PointageResult, SyncStatus};
use super::validation::Validator;
use crate::monitoring::MetricsSink;
use crate::queue::DispatchQueue;
use crate::storage::BatchRegistry;
use crate::utils::error::{Result, SyncError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// A batch as submitted by a client
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitBatch {
    pub email: String,
    pub records: PointageRecords,
    pub privileges: Vec<String>,
}

/// Answer to an accepted submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub batch_id: String,
    pub status: SyncStatus,
    pub total_count: u32,
    pub success_count: u32,
    pub failure_count: u32,
    pub message: String,
    /// False when the batch is stored but could not be queued yet
    pub sent_to_queue: bool,
}

/// Public view of a stored batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusView {
    pub batch_id: String,
    pub email: String,
    pub kind: BatchKind,
    pub status: SyncStatus,
    pub total_count: u32,
    pub success_count: u32,
    pub failure_count: u32,
    pub retry_count: u32,
    pub max_retries: u32,
    pub error_message: Option<String>,
    pub retried_from: Option<String>,
    pub results: Vec<PointageResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
}

impl From<Batch> for SyncStatusView {
    fn from(batch: Batch) -> Self {
        let kind = batch.kind();
        let duration_seconds = batch.duration_seconds();
        Self {
            batch_id: batch.batch_id,
            email: batch.email,
            kind,
            status: batch.status,
            total_count: batch.total_count,
            success_count: batch.success_count,
            failure_count: batch.failure_count,
            retry_count: batch.retry_count,
            max_retries: batch.max_retries,
            error_message: batch.error_message,
            retried_from: batch.retried_from,
            results: batch.results,
            created_at: batch.created_at,
            updated_at: batch.updated_at,
            completed_at: batch.completed_at,
            duration_seconds,
        }
    }
}

/// Entry point for clients of the pipeline
pub struct SyncService {
    registry: Arc<dyn BatchRegistry>,
    queue: Arc<dyn DispatchQueue>,
    validator: Validator,
    metrics: Arc<dyn MetricsSink>,
    max_retries: u32,
    success_markers: Vec<String>,
}

impl SyncService {
    pub fn new(
        registry: Arc<dyn BatchRegistry>,
        queue: Arc<dyn DispatchQueue>,
        validator: Validator,
        metrics: Arc<dyn MetricsSink>,
        max_retries: u32,
        success_markers: Vec<String>,
    ) -> Self {
        Self {
            registry,
            queue,
            validator,
            metrics,
            max_retries,
            success_markers,
        }
    }

    /// Validate, store and queue a batch
    pub async fn submit(&self, request: SubmitBatch) -> Result<SyncResponse> {
        self.accept(request, None).await
    }

    async fn accept(&self, request: SubmitBatch, retried_from: Option<String>) -> Result<SyncResponse> {
        self.metrics.batch_received(request.records.kind());

        let violations = self.validator.validate_now(&request.records);
        if !violations.is_empty() {
            warn!(
                email = %request.email,
                violations = violations.len(),
                "Batch rejected"
            );
            self.metrics.batch_rejected();
            return Err(SyncError::Validation(violations));
        }

        let mut batch = Batch::new(
            Uuid::new_v4().to_string(),
            request.email,
            request.records,
            request.privileges,
            self.max_retries,
            Utc::now(),
        );
        batch.retried_from = retried_from;
        self.registry.create(&batch).await?;

        info!(
            batch_id = %batch.batch_id,
            kind = %batch.kind(),
            total = batch.total_count,
            "Batch accepted"
        );

        let message = DispatchMessage::for_batch(&batch, 0, Utc::now());
        let sent_to_queue = match self.queue.publish(message).await {
            Ok(()) => {
                self.metrics.batch_published();
                true
            }
            Err(e) => {
                error!(batch_id = %batch.batch_id, error = %e, "Failed to queue batch");
                self.metrics.publish_failed();
                self.registry
                    .apply_transition(
                        &batch.batch_id,
                        &BatchTransition::Annotate {
                            error: format!("queue publish failed: {}", e),
                        },
                    )
                    .await?;
                false
            }
        };

        Ok(SyncResponse {
            message: if sent_to_queue {
                format!("{} pointages queued for synchronization", batch.total_count)
            } else {
                "batch stored, queueing will be retried".to_string()
            },
            batch_id: batch.batch_id,
            status: SyncStatus::Pending,
            total_count: batch.total_count,
            success_count: 0,
            failure_count: 0,
            sent_to_queue,
        })
    }

    /// Current state of a batch
    pub async fn status(&self, batch_id: &str) -> Result<SyncStatusView> {
        self.registry
            .find_by_id(batch_id)
            .await?
            .map(SyncStatusView::from)
            .ok_or_else(|| SyncError::BatchNotFound(batch_id.to_string()))
    }

    /// FAILED and PARTIAL_FAILURE batches of `email`, newest first
    pub async fn failures(&self, email: &str) -> Result<Vec<SyncStatusView>> {
        let batches = self
            .registry
            .find_by_email_and_status(email, &[SyncStatus::Failed, SyncStatus::PartialFailure])
            .await?;
        Ok(batches.into_iter().map(SyncStatusView::from).collect())
    }

    /// Resubmit a failed batch under a new id.
    ///
    /// Partial failures resend only the failed records when the stored
    /// results line up with the records.
    pub async fn retry(&self, batch_id: &str) -> Result<SyncResponse> {
        let batch = self
            .registry
            .find_by_id(batch_id)
            .await?
            .ok_or_else(|| SyncError::BatchNotFound(batch_id.to_string()))?;

        if !batch.status.is_retryable() {
            return Err(SyncError::NotRetryable {
                batch_id: batch_id.to_string(),
                status: batch.status.to_string(),
            });
        }

        let records = match batch.status {
            SyncStatus::PartialFailure => failed_positions(
                batch.records.len(),
                &batch.results,
                &self.success_markers,
            )
            .map(|positions| batch.records.select(&positions))
            .unwrap_or_else(|| batch.records.clone()),
            _ => batch.records.clone(),
        };

        info!(
            batch_id,
            status = %batch.status,
            records = records.len(),
            "Retrying batch"
        );

        self.accept(
            SubmitBatch {
                email: batch.email.clone(),
                records,
                privileges: batch.privileges.clone(),
            },
            Some(batch.batch_id.clone()),
        )
        .await
    }
}
