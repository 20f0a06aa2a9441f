//! Processes one dispatch message end to end

use super::aggregation::aggregate;
use super::retry::{RetryController, RetryDecision};
use super::transition::{BatchTransition, SkipReason, TransitionOutcome};
use super::types::{Batch, DispatchMessage, PointageRecords, PointageResult, SyncStatus};
use crate::config::DownstreamConfig;
use crate::core::downstream::{DownstreamError, PointageClient};
use crate::monitoring::MetricsSink;
use crate::storage::BatchRegistry;
use crate::utils::error::{Result, SyncError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Downstream settings the executor needs
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Hard deadline for one downstream call
    pub timeout: Duration,
    pub success_markers: Vec<String>,
    pub default_privileges: Vec<String>,
}

impl From<&DownstreamConfig> for ExecutorSettings {
    fn from(config: &DownstreamConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            success_markers: config.success_markers.clone(),
            default_privileges: config.default_privileges.clone(),
        }
    }
}

/// How a message was handled
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// Downstream answered; the batch is COMPLETED or PARTIAL_FAILURE
    Completed(Batch),
    /// Permanent downstream failure; the batch is FAILED with no retry
    Failed(Batch),
    /// Transient failure handled by the retry controller
    Retried(RetryDecision),
    /// Nothing to do: the batch is terminal or held by another worker
    Duplicate(SkipReason),
}

/// Sync executor
pub struct SyncExecutor {
    registry: Arc<dyn BatchRegistry>,
    client: Arc<dyn PointageClient>,
    retry: Arc<RetryController>,
    metrics: Arc<dyn MetricsSink>,
    settings: ExecutorSettings,
}

impl SyncExecutor {
    pub fn new(
        registry: Arc<dyn BatchRegistry>,
        client: Arc<dyn PointageClient>,
        retry: Arc<RetryController>,
        metrics: Arc<dyn MetricsSink>,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            registry,
            client,
            retry,
            metrics,
            settings,
        }
    }

    /// Process `message` against the stored batch.
    ///
    /// Fails with `BatchNotFound` when the batch does not exist. Downstream
    /// failures never surface as errors: they end up in the batch status.
    pub async fn execute(&self, message: &DispatchMessage) -> Result<ExecutionOutcome> {
        let batch_id = message.batch_id.as_str();

        let batch = self
            .registry
            .find_by_id(batch_id)
            .await?
            .ok_or_else(|| SyncError::BatchNotFound(batch_id.to_string()))?;

        if batch.is_terminal() {
            debug!(batch_id, status = %batch.status, "Batch already terminal, skipping");
            return Ok(ExecutionOutcome::Duplicate(SkipReason::Terminal(batch.status)));
        }

        if let TransitionOutcome::Skipped { reason, .. } = self
            .registry
            .apply_transition(batch_id, &BatchTransition::Start)
            .await?
        {
            debug!(batch_id, %reason, "Batch not claimed");
            return Ok(ExecutionOutcome::Duplicate(reason));
        }

        info!(
            batch_id,
            kind = %message.kind(),
            records = message.records.len(),
            retry_count = message.retry_count,
            "Processing batch"
        );

        let started = Instant::now();
        let response = self.call_downstream(message).await;
        self.metrics
            .downstream_call(started.elapsed(), response.is_ok());

        match response {
            Ok(results) => self.complete(message, results).await,
            Err(err) if err.is_retryable() => {
                warn!(batch_id, error = %err, "Transient downstream failure");
                let decision = self.retry.handle_failure(message, &err.to_string()).await?;
                Ok(ExecutionOutcome::Retried(decision))
            }
            Err(err) => {
                error!(batch_id, error = %err, "Permanent downstream failure");
                let outcome = self
                    .registry
                    .apply_transition(
                        batch_id,
                        &BatchTransition::Fail {
                            error: err.to_string(),
                        },
                    )
                    .await?;

                match outcome {
                    TransitionOutcome::Applied(batch) => {
                        self.metrics.batch_finished(SyncStatus::Failed);
                        Ok(ExecutionOutcome::Failed(batch))
                    }
                    TransitionOutcome::Skipped { reason, .. } => {
                        Ok(ExecutionOutcome::Duplicate(reason))
                    }
                }
            }
        }
    }

    async fn complete(
        &self,
        message: &DispatchMessage,
        results: Vec<PointageResult>,
    ) -> Result<ExecutionOutcome> {
        let batch_id = message.batch_id.as_str();
        let summary = aggregate(
            message.records.len(),
            &results,
            &self.settings.success_markers,
        );
        if let Some(note) = &summary.note {
            warn!(batch_id, "{}", note);
        }

        match self
            .registry
            .apply_transition(batch_id, &summary.into_transition(results))
            .await?
        {
            TransitionOutcome::Applied(batch) => {
                info!(
                    batch_id,
                    status = %batch.status,
                    success = batch.success_count,
                    failure = batch.failure_count,
                    "Batch processed"
                );
                self.metrics.batch_finished(batch.status);
                Ok(ExecutionOutcome::Completed(batch))
            }
            TransitionOutcome::Skipped { reason, .. } => {
                warn!(batch_id, %reason, "Results discarded");
                Ok(ExecutionOutcome::Duplicate(reason))
            }
        }
    }

    async fn call_downstream(
        &self,
        message: &DispatchMessage,
    ) -> std::result::Result<Vec<PointageResult>, DownstreamError> {
        let email = message.email.as_str();
        let call = async {
            match &message.records {
                PointageRecords::Standard(records) => {
                    self.client.submit_standard(email, records).await
                }
                PointageRecords::Terrain(records) => {
                    let privileges = if message.privileges.is_empty() {
                        &self.settings.default_privileges
                    } else {
                        &message.privileges
                    };
                    self.client.submit_terrain(email, records, privileges).await
                }
            }
        };

        tokio::time::timeout(self.settings.timeout, call)
            .await
            .unwrap_or(Err(DownstreamError::Timeout))
    }
}
