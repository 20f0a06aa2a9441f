//! In-process batch registry

use super::registry::BatchRegistry;
use crate::core::sync::transition::{BatchTransition, TransitionOutcome};
use crate::core::sync::types::{Batch, SyncStatus};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashMap;
use tracing::debug;

/// Registry kept in a concurrent map; each transition runs under the
/// entry's shard lock, so no compare-and-swap is needed
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    batches: DashMap<String, Batch>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

#[async_trait]
impl BatchRegistry for InMemoryRegistry {
    async fn create(&self, batch: &Batch) -> Result<()> {
        match self.batches.entry(batch.batch_id.clone()) {
            Entry::Occupied(_) => Err(SyncError::DuplicateBatchId(batch.batch_id.clone())),
            Entry::Vacant(slot) => {
                slot.insert(batch.clone());
                Ok(())
            }
        }
    }

    async fn find_by_id(&self, batch_id: &str) -> Result<Option<Batch>> {
        Ok(self.batches.get(batch_id).map(|b| b.clone()))
    }

    async fn find_by_email_and_status(
        &self,
        email: &str,
        statuses: &[SyncStatus],
    ) -> Result<Vec<Batch>> {
        let mut found: Vec<Batch> = self
            .batches
            .iter()
            .filter(|b| b.email == email && statuses.contains(&b.status))
            .map(|b| b.clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn apply_transition(
        &self,
        batch_id: &str,
        transition: &BatchTransition,
    ) -> Result<TransitionOutcome> {
        let mut entry = self
            .batches
            .get_mut(batch_id)
            .ok_or_else(|| SyncError::BatchNotFound(batch_id.to_string()))?;

        match entry.apply(transition, Utc::now()) {
            Ok(next) => {
                debug!(
                    batch_id,
                    from = %entry.status,
                    to = %next.status,
                    "Applied {}",
                    transition.name()
                );
                *entry = next.clone();
                Ok(TransitionOutcome::Applied(next))
            }
            Err(reason) => Ok(TransitionOutcome::Skipped {
                batch: entry.clone(),
                reason,
            }),
        }
    }

    async fn find_stalled(
        &self,
        statuses: &[SyncStatus],
        updated_before: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Batch>> {
        let mut found: Vec<Batch> = self
            .batches
            .iter()
            .filter(|b| statuses.contains(&b.status) && b.updated_at <= updated_before)
            .map(|b| b.clone())
            .collect();
        found.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn purge_terminal_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut removed = 0u64;
        self.batches.retain(|_, b| {
            let expired = b.is_terminal() && b.created_at < cutoff;
            if expired {
                removed += 1;
            }
            !expired
        });
        Ok(removed)
    }

    async fn count_by_status(&self) -> Result<HashMap<SyncStatus, u64>> {
        let mut counts = HashMap::new();
        for batch in self.batches.iter() {
            *counts.entry(batch.status).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
