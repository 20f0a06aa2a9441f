//! Recovery of stalled batches and housekeeping purge
//!
//! A batch is stalled when it is PENDING or RETRY and nothing touched it
//! for `stale_after`, or IN_PROGRESS past its lease. This covers messages
//! lost by the broker, failed publishes at ingress and workers that died
//! mid-batch. Terminal batches are never touched, and every reclaim spends
//! one unit of the batch's retry budget.

use super::transition::{BatchTransition, TransitionOutcome};
use super::types::{Batch, DispatchMessage, SyncStatus};
use crate::monitoring::MetricsSink;
use crate::queue::{DeadLetterReason, DispatchQueue};
use crate::storage::BatchRegistry;
use crate::utils::error::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Batches examined per status group and sweep
const SWEEP_LIMIT: u64 = 500;

/// Sweeper timing
#[derive(Debug, Clone, Copy)]
pub struct SweepSettings {
    pub stale_after: Duration,
    pub in_progress_lease: Duration,
    /// Delete terminal batches older than this; `None` disables the purge
    pub purge_after: Option<Duration>,
}

/// Counters for one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub requeued: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Periodic recovery sweep
pub struct RecoverySweeper {
    registry: Arc<dyn BatchRegistry>,
    queue: Arc<dyn DispatchQueue>,
    metrics: Arc<dyn MetricsSink>,
    settings: SweepSettings,
}

impl RecoverySweeper {
    pub fn new(
        registry: Arc<dyn BatchRegistry>,
        queue: Arc<dyn DispatchQueue>,
        metrics: Arc<dyn MetricsSink>,
        settings: SweepSettings,
    ) -> Self {
        Self {
            registry,
            queue,
            metrics,
            settings,
        }
    }

    /// Reclaim every stalled batch once
    pub async fn sweep(&self) -> Result<SweepReport> {
        let now = Utc::now();
        let mut report = SweepReport::default();

        let waiting_cutoff = now - self.settings.stale_after;
        let waiting = self
            .registry
            .find_stalled(
                &[SyncStatus::Pending, SyncStatus::Retry],
                waiting_cutoff,
                SWEEP_LIMIT,
            )
            .await?;
        for batch in waiting {
            self.reclaim(batch, waiting_cutoff, "not dispatched in time", &mut report)
                .await?;
        }

        let lease_cutoff = now - self.settings.in_progress_lease;
        let running = self
            .registry
            .find_stalled(&[SyncStatus::InProgress], lease_cutoff, SWEEP_LIMIT)
            .await?;
        for batch in running {
            self.reclaim(batch, lease_cutoff, "processing lease expired", &mut report)
                .await?;
        }

        if report != SweepReport::default() {
            info!(
                requeued = report.requeued,
                failed = report.failed,
                skipped = report.skipped,
                "Recovery sweep finished"
            );
        } else {
            debug!("Recovery sweep found nothing to do");
        }
        Ok(report)
    }

    async fn reclaim(
        &self,
        batch: Batch,
        stalled_before: chrono::DateTime<Utc>,
        cause: &str,
        report: &mut SweepReport,
    ) -> Result<()> {
        let batch_id = batch.batch_id.as_str();
        let within_budget = batch.retry_count < batch.max_retries;
        let next_retry = within_budget.then_some(batch.retry_count + 1);

        let transition = BatchTransition::Reclaim {
            observed: batch.status,
            stalled_before,
            error: format!("{} (was {})", cause, batch.status),
            next_retry,
        };

        let reclaimed = match self.registry.apply_transition(batch_id, &transition).await? {
            TransitionOutcome::Applied(reclaimed) => reclaimed,
            TransitionOutcome::Skipped { reason, .. } => {
                debug!(batch_id, %reason, "Batch moved before reclaim");
                report.skipped += 1;
                return Ok(());
            }
        };

        let message = DispatchMessage::for_batch(&reclaimed, reclaimed.retry_count, Utc::now());
        match next_retry {
            Some(retry_count) => {
                warn!(batch_id, retry_count, "Requeueing stalled batch");
                self.queue.publish(message).await?;
                self.metrics.retry_scheduled();
                report.requeued += 1;
            }
            None => {
                warn!(batch_id, "Stalled batch has no retries left");
                self.metrics.batch_finished(SyncStatus::Failed);
                self.queue
                    .dead_letter(message, DeadLetterReason::RetriesExhausted)
                    .await?;
                report.failed += 1;
            }
        }
        Ok(())
    }

    /// Delete old terminal batches; returns the number removed
    pub async fn purge(&self) -> Result<u64> {
        let Some(age) = self.settings.purge_after else {
            return Ok(0);
        };

        let removed = self
            .registry
            .purge_terminal_before(Utc::now() - age)
            .await?;
        if removed > 0 {
            info!(removed, "Purged old terminal batches");
        }
        Ok(removed)
    }
}
