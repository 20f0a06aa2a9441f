//! Batch validation rules
//!
//! Validation is pure: the reference time is passed in, and the caller
//! decides what to do with the returned violations. An empty list means the
//! batch may be accepted.

use super::types::{PointageRecords, StandardPointage, TerrainPointage};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Position of the offending record; `None` for batch-level rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn batch(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            index: None,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn record(index: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "Pointage[{}]: {}", index, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Bounds applied by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    pub max_batch_size: usize,
    pub retention_days: i64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
            retention_days: 30,
        }
    }
}

/// Batch validator
#[derive(Debug, Clone, Default)]
pub struct Validator {
    limits: ValidationLimits,
}

impl Validator {
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    /// Validate against the local wall clock
    pub fn validate_now(&self, records: &PointageRecords) -> Vec<Violation> {
        self.validate(records, chrono::Local::now().naive_local())
    }

    /// Validate `records` as of `now`
    pub fn validate(&self, records: &PointageRecords, now: NaiveDateTime) -> Vec<Violation> {
        if records.is_empty() {
            return vec![Violation::batch("pointages", "pointage list is empty")];
        }

        let mut violations = Vec::new();

        if records.len() > self.limits.max_batch_size {
            violations.push(Violation::batch(
                "pointages",
                format!(
                    "too many pointages in batch ({} > max {})",
                    records.len(),
                    self.limits.max_batch_size
                ),
            ));
        }

        match records {
            PointageRecords::Standard(items) => {
                for (index, record) in items.iter().enumerate() {
                    self.check_standard(index, record, now, &mut violations);
                }
            }
            PointageRecords::Terrain(items) => {
                for (index, record) in items.iter().enumerate() {
                    self.check_terrain(index, record, now, &mut violations);
                }
            }
        }

        violations
    }

    fn check_standard(
        &self,
        index: usize,
        record: &StandardPointage,
        now: NaiveDateTime,
        out: &mut Vec<Violation>,
    ) {
        match record.badge_id {
            Some(id) if id > 0 => {}
            Some(_) => out.push(Violation::record(index, "badge_id", "badge id must be positive")),
            None => out.push(Violation::record(index, "badge_id", "badge id is required")),
        }

        self.check_timestamp(index, record.timestamp, now, out);
    }

    fn check_terrain(
        &self,
        index: usize,
        record: &TerrainPointage,
        now: NaiveDateTime,
        out: &mut Vec<Violation>,
    ) {
        self.check_timestamp(index, record.timestamp, now, out);

        match record.latitude {
            None => out.push(Violation::record(
                index,
                "latitude",
                "latitude is required for terrain pointages",
            )),
            Some(lat) if !(-90.0..=90.0).contains(&lat) => out.push(Violation::record(
                index,
                "latitude",
                "latitude must be between -90 and 90",
            )),
            Some(_) => {}
        }

        match record.longitude {
            None => out.push(Violation::record(
                index,
                "longitude",
                "longitude is required for terrain pointages",
            )),
            Some(lon) if !(-180.0..=180.0).contains(&lon) => out.push(Violation::record(
                index,
                "longitude",
                "longitude must be between -180 and 180",
            )),
            Some(_) => {}
        }
    }

    fn check_timestamp(
        &self,
        index: usize,
        timestamp: Option<NaiveDateTime>,
        now: NaiveDateTime,
        out: &mut Vec<Violation>,
    ) {
        let Some(timestamp) = timestamp else {
            out.push(Violation::record(index, "timestamp", "timestamp is required"));
            return;
        };

        let oldest = Duration::try_days(self.limits.retention_days)
            .and_then(|window| now.checked_sub_signed(window));
        if oldest.is_some_and(|oldest| timestamp < oldest) {
            out.push(Violation::record(
                index,
                "timestamp",
                format!(
                    "pointage is too old (max {} days)",
                    self.limits.retention_days
                ),
            ));
        }

        if timestamp > now {
            out.push(Violation::record(
                index,
                "timestamp",
                "pointage in the future is not allowed",
            ));
        }
    }
}
