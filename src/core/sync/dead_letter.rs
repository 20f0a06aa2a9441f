//! Terminal sink for messages that left the main queue

use super::transition::{BatchTransition, TransitionOutcome};
use super::types::SyncStatus;
use crate::monitoring::{Alert, AlertManager, AlertSeverity, MetricsSink};
use crate::queue::DeadLetter;
use crate::storage::BatchRegistry;
use crate::utils::error::Result;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

/// Marks dead-lettered batches FAILED and raises an alert
pub struct DeadLetterHandler {
    registry: Arc<dyn BatchRegistry>,
    alerts: Arc<AlertManager>,
    metrics: Arc<dyn MetricsSink>,
}

impl DeadLetterHandler {
    pub fn new(
        registry: Arc<dyn BatchRegistry>,
        alerts: Arc<AlertManager>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            registry,
            alerts,
            metrics,
        }
    }

    /// Handle one dead letter. Repeating it changes nothing more.
    pub async fn handle(&self, entry: DeadLetter) -> Result<()> {
        let message = &entry.message;
        let batch_id = message.batch_id.as_str();

        error!(
            batch_id,
            reason = %entry.reason,
            retry_count = message.retry_count,
            max_retries = message.max_retries,
            "Batch dead-lettered"
        );

        if self.registry.find_by_id(batch_id).await?.is_some() {
            let outcome = self
                .registry
                .apply_transition(
                    batch_id,
                    &BatchTransition::Fail {
                        error: format!("sent to dead-letter queue: {}", entry.reason),
                    },
                )
                .await?;
            if let TransitionOutcome::Applied(_) = outcome {
                self.metrics.batch_finished(SyncStatus::Failed);
            }
        } else {
            warn!(batch_id, "Dead letter for unknown batch");
        }
        self.metrics.dead_lettered();

        let alert = Alert::new(
            AlertSeverity::Critical,
            "Offline pointage batch dead-lettered",
            format!(
                "Batch {} of {} failed after {} of {} retries: {}",
                batch_id, message.email, message.retry_count, message.max_retries, entry.reason
            ),
            "offline-sync",
        )
        .with_metadata(json!({
            "batchId": batch_id,
            "kind": message.kind(),
            "email": message.email,
            "retryCount": message.retry_count,
            "maxRetries": message.max_retries,
            "reason": entry.reason.to_string(),
        }));

        self.alerts.send_alert(alert).await
    }
}
