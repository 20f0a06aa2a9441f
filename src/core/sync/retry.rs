//! Requeue or give up after a transient failure

use super::transition::{BatchTransition, TransitionOutcome};
use super::types::{DispatchMessage, SyncStatus};
use crate::monitoring::MetricsSink;
use crate::queue::{DeadLetterReason, DispatchQueue};
use crate::storage::BatchRegistry;
use crate::utils::error::{Result, RetryPolicy};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// What the controller did with a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// The batch is RETRY and the next message was published after `delay`
    Requeued { retry_count: u32, delay: Duration },
    /// The budget is spent; the batch is FAILED and dead-lettered
    Exhausted,
    /// The batch changed under us and was left alone
    Abandoned,
}

/// Applies the backoff policy to transient failures
pub struct RetryController {
    registry: Arc<dyn BatchRegistry>,
    queue: Arc<dyn DispatchQueue>,
    policy: RetryPolicy,
    metrics: Arc<dyn MetricsSink>,
}

impl RetryController {
    pub fn new(
        registry: Arc<dyn BatchRegistry>,
        queue: Arc<dyn DispatchQueue>,
        policy: RetryPolicy,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            registry,
            queue,
            policy,
            metrics,
        }
    }

    /// Handle a transient failure of `message`.
    ///
    /// Within budget the batch goes to RETRY, the calling task sleeps for
    /// the backoff delay, and the next attempt is published. Otherwise the
    /// batch fails and the message is dead-lettered.
    pub async fn handle_failure(
        &self,
        message: &DispatchMessage,
        error: &str,
    ) -> Result<RetryDecision> {
        let batch_id = message.batch_id.as_str();

        if !self
            .policy
            .should_retry(message.retry_count, message.max_retries)
        {
            warn!(
                batch_id,
                retry_count = message.retry_count,
                max_retries = message.max_retries,
                "Retry budget exhausted"
            );

            let outcome = self
                .registry
                .apply_transition(
                    batch_id,
                    &BatchTransition::Fail {
                        error: format!(
                            "max retries ({}) exceeded: {}",
                            message.max_retries, error
                        ),
                    },
                )
                .await?;
            if outcome.is_applied() {
                self.metrics.batch_finished(SyncStatus::Failed);
            }

            self.queue
                .dead_letter(message.clone(), DeadLetterReason::RetriesExhausted)
                .await?;
            return Ok(RetryDecision::Exhausted);
        }

        let retry_count = message.retry_count + 1;
        let outcome = self
            .registry
            .apply_transition(
                batch_id,
                &BatchTransition::ScheduleRetry {
                    error: error.to_string(),
                    retry_count,
                },
            )
            .await?;

        if let TransitionOutcome::Skipped { reason, .. } = &outcome {
            warn!(batch_id, %reason, "Retry not scheduled");
            return Ok(RetryDecision::Abandoned);
        }

        let delay = self.policy.delay_for(message.retry_count);
        info!(
            batch_id,
            retry_count,
            delay_ms = delay.as_millis() as u64,
            "Scheduling retry"
        );
        self.metrics.retry_scheduled();

        tokio::time::sleep(delay).await;
        self.queue.publish(message.next_attempt(Utc::now())).await?;

        Ok(RetryDecision::Requeued { retry_count, delay })
    }
}
