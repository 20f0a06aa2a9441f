use crate::core::sync::types::{Batch, PointageRecords, PointageResult};
use crate::utils::error::SyncError;
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sync batch database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "sync_batches")]
pub struct Model {
    /// Batch ID (UUID v4)
    #[sea_orm(primary_key, auto_increment = false)]
    pub batch_id: String,

    /// Submitter email
    pub email: String,

    /// STANDARD or TERRAIN
    pub kind: String,

    /// Lifecycle status
    pub status: String,

    pub total_count: i32,
    pub success_count: i32,
    pub failure_count: i32,
    pub retry_count: i32,
    pub max_retries: i32,

    /// Submitted records (JSON)
    #[sea_orm(column_type = "Text")]
    pub records: String,

    /// Privilege tags (JSON array)
    #[sea_orm(column_type = "Text")]
    pub privileges: String,

    /// Per-record downstream results (JSON array)
    #[sea_orm(column_type = "Text")]
    pub results: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,

    /// Batch this one was re-submitted from
    pub retried_from: Option<String>,

    /// Optimistic concurrency token
    pub version: i64,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub completed_at: Option<DateTimeUtc>,
}

/// Sync batch entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn corrupt(batch_id: &str, what: &str, detail: impl std::fmt::Display) -> SyncError {
    SyncError::Internal(format!("Corrupt {} on batch {}: {}", what, batch_id, detail))
}

impl Model {
    /// Convert a row into the domain batch
    pub fn to_domain(&self) -> crate::utils::error::Result<Batch> {
        let status = self
            .status
            .parse()
            .map_err(|e| corrupt(&self.batch_id, "status", e))?;
        let records: PointageRecords = serde_json::from_str(&self.records)
            .map_err(|e| corrupt(&self.batch_id, "records", e))?;
        let privileges: Vec<String> = serde_json::from_str(&self.privileges)
            .map_err(|e| corrupt(&self.batch_id, "privileges", e))?;
        let results: Vec<PointageResult> = serde_json::from_str(&self.results)
            .map_err(|e| corrupt(&self.batch_id, "results", e))?;

        Ok(Batch {
            batch_id: self.batch_id.clone(),
            email: self.email.clone(),
            status,
            total_count: self.total_count.max(0) as u32,
            success_count: self.success_count.max(0) as u32,
            failure_count: self.failure_count.max(0) as u32,
            retry_count: self.retry_count.max(0) as u32,
            max_retries: self.max_retries.max(0) as u32,
            records,
            privileges,
            results,
            error_message: self.error_message.clone(),
            retried_from: self.retried_from.clone(),
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        })
    }
}

impl ActiveModel {
    /// Active model with every column set from `batch`
    pub fn from_domain(batch: &Batch) -> crate::utils::error::Result<Self> {
        Ok(Self {
            batch_id: Set(batch.batch_id.clone()),
            email: Set(batch.email.clone()),
            kind: Set(batch.kind().as_str().to_string()),
            status: Set(batch.status.as_str().to_string()),
            total_count: Set(batch.total_count as i32),
            success_count: Set(batch.success_count as i32),
            failure_count: Set(batch.failure_count as i32),
            retry_count: Set(batch.retry_count as i32),
            max_retries: Set(batch.max_retries as i32),
            records: Set(serde_json::to_string(&batch.records)?),
            privileges: Set(serde_json::to_string(&batch.privileges)?),
            results: Set(serde_json::to_string(&batch.results)?),
            error_message: Set(batch.error_message.clone()),
            retried_from: Set(batch.retried_from.clone()),
            version: Set(batch.version),
            created_at: Set(batch.created_at),
            updated_at: Set(batch.updated_at),
            completed_at: Set(batch.completed_at),
        })
    }
}
