use crate::core::sync::transition::{BatchTransition, TransitionOutcome};
use crate::core::sync::types::{Batch, SyncStatus};
use crate::storage::registry::{BatchRegistry, MAX_TRANSITION_ATTEMPTS};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::super::entities::{self, sync_batch};
use super::SeaOrmDatabase;

const TERMINAL_STATUSES: [SyncStatus; 3] = [
    SyncStatus::Completed,
    SyncStatus::PartialFailure,
    SyncStatus::Failed,
];

fn status_values(statuses: &[SyncStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

fn to_domain_all(models: Vec<sync_batch::Model>) -> Result<Vec<Batch>> {
    models.iter().map(sync_batch::Model::to_domain).collect()
}

impl SeaOrmDatabase {
    /// Write `next` only if the stored row still has `expected_version`
    async fn compare_and_swap(&self, next: &Batch, expected_version: i64) -> Result<bool> {
        let active = sync_batch::ActiveModel::from_domain(next)?;

        let result = entities::SyncBatch::update_many()
            .set(active)
            .filter(sync_batch::Column::BatchId.eq(next.batch_id.as_str()))
            .filter(sync_batch::Column::Version.eq(expected_version))
            .exec(&self.db)
            .await
            .map_err(SyncError::Database)?;

        Ok(result.rows_affected == 1)
    }
}

#[async_trait]
impl BatchRegistry for SeaOrmDatabase {
    async fn create(&self, batch: &Batch) -> Result<()> {
        debug!("Creating batch: {}", batch.batch_id);

        if self.find_by_id(&batch.batch_id).await?.is_some() {
            return Err(SyncError::DuplicateBatchId(batch.batch_id.clone()));
        }

        let active_model = sync_batch::ActiveModel::from_domain(batch)?;
        entities::SyncBatch::insert(active_model)
            .exec(&self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    SyncError::DuplicateBatchId(batch.batch_id.clone())
                }
                _ => SyncError::Database(e),
            })?;

        Ok(())
    }

    async fn find_by_id(&self, batch_id: &str) -> Result<Option<Batch>> {
        debug!("Finding batch by ID: {}", batch_id);

        entities::SyncBatch::find_by_id(batch_id.to_string())
            .one(&self.db)
            .await
            .map_err(SyncError::Database)?
            .map(|model| model.to_domain())
            .transpose()
    }

    async fn find_by_email_and_status(
        &self,
        email: &str,
        statuses: &[SyncStatus],
    ) -> Result<Vec<Batch>> {
        debug!("Finding batches for {} in {:?}", email, statuses);

        let models = entities::SyncBatch::find()
            .filter(sync_batch::Column::Email.eq(email))
            .filter(sync_batch::Column::Status.is_in(status_values(statuses)))
            .order_by_desc(sync_batch::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(SyncError::Database)?;

        to_domain_all(models)
    }

    async fn apply_transition(
        &self,
        batch_id: &str,
        transition: &BatchTransition,
    ) -> Result<TransitionOutcome> {
        for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
            let current = self
                .find_by_id(batch_id)
                .await?
                .ok_or_else(|| SyncError::BatchNotFound(batch_id.to_string()))?;

            let next = match current.apply(transition, Utc::now()) {
                Ok(next) => next,
                Err(reason) => {
                    return Ok(TransitionOutcome::Skipped {
                        batch: current,
                        reason,
                    });
                }
            };

            if self.compare_and_swap(&next, current.version).await? {
                debug!(
                    batch_id,
                    from = %current.status,
                    to = %next.status,
                    "Applied {}",
                    transition.name()
                );
                return Ok(TransitionOutcome::Applied(next));
            }

            debug!(batch_id, attempt, "Version conflict, reloading batch");
        }

        warn!(
            batch_id,
            "Giving up {} after {} conflicting updates",
            transition.name(),
            MAX_TRANSITION_ATTEMPTS
        );
        Err(SyncError::RegistryConflict(batch_id.to_string()))
    }

    async fn find_stalled(
        &self,
        statuses: &[SyncStatus],
        updated_before: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Batch>> {
        let models = entities::SyncBatch::find()
            .filter(sync_batch::Column::Status.is_in(status_values(statuses)))
            .filter(sync_batch::Column::UpdatedAt.lte(updated_before))
            .order_by_asc(sync_batch::Column::UpdatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(SyncError::Database)?;

        to_domain_all(models)
    }

    async fn purge_terminal_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = entities::SyncBatch::delete_many()
            .filter(sync_batch::Column::Status.is_in(status_values(&TERMINAL_STATUSES)))
            .filter(sync_batch::Column::CreatedAt.lt(cutoff))
            .exec(&self.db)
            .await
            .map_err(SyncError::Database)?;

        Ok(result.rows_affected)
    }

    async fn count_by_status(&self) -> Result<HashMap<SyncStatus, u64>> {
        let rows: Vec<(String, i64)> = entities::SyncBatch::find()
            .select_only()
            .column(sync_batch::Column::Status)
            .column_as(Expr::col(sync_batch::Column::BatchId).count(), "count")
            .group_by(sync_batch::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(SyncError::Database)?;

        let mut counts = HashMap::new();
        for (status, count) in rows {
            match status.parse::<SyncStatus>() {
                Ok(status) => {
                    counts.insert(status, count.max(0) as u64);
                }
                Err(e) => warn!("Skipping unknown status in counts: {}", e),
            }
        }
        Ok(counts)
    }

    async fn health_check(&self) -> Result<()> {
        self.db.ping().await.map_err(SyncError::Database)
    }
}
