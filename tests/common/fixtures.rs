//! Test fixtures and data factories

use chrono::{Duration, Local, NaiveDateTime, Utc};
use pointage_sync::core::sync::{
    Batch, PointageRecords, PointageResult, StandardPointage, TerrainPointage,
};

/// A timestamp inside the retention window
pub fn recent_timestamp() -> NaiveDateTime {
    Local::now().naive_local() - Duration::hours(2)
}

/// Factory for batches and their records
pub struct BatchFactory;

impl BatchFactory {
    pub fn standard_records(count: usize) -> PointageRecords {
        PointageRecords::Standard(
            (0..count)
                .map(|i| StandardPointage {
                    badge_id: Some(1000 + i as i64),
                    timestamp: Some(recent_timestamp()),
                })
                .collect(),
        )
    }

    pub fn terrain_records(count: usize) -> PointageRecords {
        PointageRecords::Terrain(
            (0..count)
                .map(|i| TerrainPointage {
                    timestamp: Some(recent_timestamp()),
                    latitude: Some(14.69 + i as f64 * 0.01),
                    longitude: Some(-17.44),
                })
                .collect(),
        )
    }

    /// A PENDING standard batch created `age_minutes` ago
    pub fn standard_aged(id: &str, count: usize, age_minutes: i64) -> Batch {
        Batch::new(
            id,
            "agent@example.com",
            Self::standard_records(count),
            vec![],
            3,
            Utc::now() - Duration::minutes(age_minutes),
        )
    }

    pub fn standard(id: &str, count: usize) -> Batch {
        Self::standard_aged(id, count, 0)
    }

    pub fn for_email(id: &str, email: &str, age_minutes: i64) -> Batch {
        let mut batch = Self::standard_aged(id, 1, age_minutes);
        batch.email = email.to_string();
        batch
    }
}

/// A downstream result with the given outcome
pub fn result(outcome: &str) -> PointageResult {
    PointageResult {
        subject: Some("1000".to_string()),
        date: None,
        is_terrain: false,
        outcome: outcome.to_string(),
        message: None,
    }
}
