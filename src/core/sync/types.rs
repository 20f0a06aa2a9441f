//! Batch, record and dispatch message types

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Privilege sent with terrain batches when the submitter provided none
pub const DEFAULT_PRIVILEGE: &str = "AUTH_COLLABORATEUR";

/// Batch lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    Pending,
    InProgress,
    Completed,
    PartialFailure,
    Failed,
    Retry,
}

impl SyncStatus {
    /// Terminal statuses never change again
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::PartialFailure | Self::Failed)
    }

    /// Statuses a user may trigger a retry from
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Failed | Self::PartialFailure)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::PartialFailure => "PARTIAL_FAILURE",
            Self::Failed => "FAILED",
            Self::Retry => "RETRY",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "PARTIAL_FAILURE" => Ok(Self::PartialFailure),
            "FAILED" => Ok(Self::Failed),
            "RETRY" => Ok(Self::Retry),
            other => Err(format!("unknown sync status: {}", other)),
        }
    }
}

/// Kind of pointage carried by a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchKind {
    /// Badge-based pointages
    Standard,
    /// GPS-located pointages
    Terrain,
}

impl BatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Terrain => "TERRAIN",
        }
    }
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STANDARD" => Ok(Self::Standard),
            "TERRAIN" => Ok(Self::Terrain),
            other => Err(format!("unknown batch kind: {}", other)),
        }
    }
}

/// Badge-based time-clock event
///
/// Fields are optional so that missing values surface as validation
/// violations instead of deserialization errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardPointage {
    #[serde(default, alias = "matricule")]
    pub badge_id: Option<i64>,
    #[serde(default, alias = "heurePointage")]
    pub timestamp: Option<NaiveDateTime>,
}

/// GPS-located time-clock event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainPointage {
    #[serde(default, alias = "heurePointage")]
    pub timestamp: Option<NaiveDateTime>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Records of a batch; a batch never mixes both kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointageRecords {
    Standard(Vec<StandardPointage>),
    Terrain(Vec<TerrainPointage>),
}

impl PointageRecords {
    pub fn kind(&self) -> BatchKind {
        match self {
            Self::Standard(_) => BatchKind::Standard,
            Self::Terrain(_) => BatchKind::Terrain,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Standard(records) => records.len(),
            Self::Terrain(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep only the records at the given positions, in order
    pub fn select(&self, indices: &[usize]) -> Self {
        fn pick<T: Clone>(records: &[T], indices: &[usize]) -> Vec<T> {
            indices
                .iter()
                .filter_map(|&i| records.get(i).cloned())
                .collect()
        }

        match self {
            Self::Standard(records) => Self::Standard(pick(records, indices)),
            Self::Terrain(records) => Self::Terrain(pick(records, indices)),
        }
    }
}

/// Outcome reported by the pointage service for one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointageResult {
    /// Agent or subject the record was booked for
    #[serde(default, alias = "agent", deserialize_with = "lenient_string")]
    pub subject: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, alias = "isTerrain")]
    pub is_terrain: bool,
    /// Status marker, e.g. `SUCCESS`
    #[serde(default, alias = "statut")]
    pub outcome: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl PointageResult {
    /// Whether the outcome matches one of the success markers
    pub fn is_success(&self, markers: &[String]) -> bool {
        let outcome = self.outcome.trim();
        markers.iter().any(|m| m.eq_ignore_ascii_case(outcome))
    }
}

/// Accept strings, numbers or arrays and keep their textual form
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Durable record of one submitted batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: String,
    pub email: String,
    pub status: SyncStatus,
    pub total_count: u32,
    pub success_count: u32,
    pub failure_count: u32,
    /// Requeues consumed so far
    pub retry_count: u32,
    pub max_retries: u32,
    pub records: PointageRecords,
    pub privileges: Vec<String>,
    pub results: Vec<PointageResult>,
    pub error_message: Option<String>,
    /// Batch this one was re-submitted from
    pub retried_from: Option<String>,
    /// Optimistic concurrency token, bumped on every change
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Batch {
    /// Create a new PENDING batch
    pub fn new(
        batch_id: impl Into<String>,
        email: impl Into<String>,
        records: PointageRecords,
        privileges: Vec<String>,
        max_retries: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            batch_id: batch_id.into(),
            email: email.into(),
            status: SyncStatus::Pending,
            total_count: records.len() as u32,
            success_count: 0,
            failure_count: 0,
            retry_count: 0,
            max_retries,
            records,
            privileges,
            results: Vec::new(),
            error_message: None,
            retried_from: None,
            version: 0,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn kind(&self) -> BatchKind {
        self.records.kind()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Seconds between creation and completion
    pub fn duration_seconds(&self) -> Option<i64> {
        self.completed_at
            .map(|done| (done - self.created_at).num_seconds())
    }
}

/// Queue payload; enough on its own to reprocess a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchMessage {
    pub batch_id: String,
    pub email: String,
    pub records: PointageRecords,
    #[serde(default)]
    pub privileges: Vec<String>,
    #[serde(default)]
    pub retry_count: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
}

impl DispatchMessage {
    /// Build the message for a stored batch
    pub fn for_batch(batch: &Batch, retry_count: u32, now: DateTime<Utc>) -> Self {
        Self {
            batch_id: batch.batch_id.clone(),
            email: batch.email.clone(),
            records: batch.records.clone(),
            privileges: batch.privileges.clone(),
            retry_count,
            max_retries: batch.max_retries,
            created_at: now,
        }
    }

    /// Same message for the next attempt
    pub fn next_attempt(&self, now: DateTime<Utc>) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            created_at: now,
            ..self.clone()
        }
    }

    pub fn kind(&self) -> BatchKind {
        self.records.kind()
    }
}
