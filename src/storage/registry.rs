//! Batch registry trait

use crate::core::sync::transition::{BatchTransition, TransitionOutcome};
use crate::core::sync::types::{Batch, SyncStatus};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Optimistic update attempts before a `RegistryConflict` is reported
pub const MAX_TRANSITION_ATTEMPTS: usize = 8;

/// Durable record of every batch
#[async_trait]
pub trait BatchRegistry: Send + Sync {
    /// Insert a new batch; fails with `DuplicateBatchId` if the id exists
    async fn create(&self, batch: &Batch) -> Result<()>;

    async fn find_by_id(&self, batch_id: &str) -> Result<Option<Batch>>;

    /// Batches of `email` in any of `statuses`, newest first
    async fn find_by_email_and_status(
        &self,
        email: &str,
        statuses: &[SyncStatus],
    ) -> Result<Vec<Batch>>;

    /// Atomically apply `transition` to the stored batch.
    ///
    /// Fails with `BatchNotFound` for unknown ids. A transition that does not
    /// apply to the current state returns `Skipped` without writing.
    async fn apply_transition(
        &self,
        batch_id: &str,
        transition: &BatchTransition,
    ) -> Result<TransitionOutcome>;

    /// Batches in `statuses` not updated since `updated_before`, oldest first
    async fn find_stalled(
        &self,
        statuses: &[SyncStatus],
        updated_before: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Batch>>;

    /// Delete terminal batches created before `cutoff`; returns the number removed
    async fn purge_terminal_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Number of batches per status
    async fn count_by_status(&self) -> Result<HashMap<SyncStatus, u64>>;

    async fn health_check(&self) -> Result<()>;
}
