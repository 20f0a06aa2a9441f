//! Pipeline configuration

use super::*;
use crate::core::sync::validation::ValidationLimits;
use crate::utils::error::RetryConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Validation, retry and worker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Maximum records per batch
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Oldest accepted pointage, in days
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    /// Requeues allowed per batch
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// First backoff delay in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Concurrent queue consumers
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Recovery sweep period in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// PENDING or RETRY batches untouched for this long are reclaimed
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,
    /// IN_PROGRESS batches untouched for this long are reclaimed
    #[serde(default = "default_in_progress_lease")]
    pub in_progress_lease_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            retention_days: default_retention_days(),
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            workers: default_workers(),
            sweep_interval_secs: default_sweep_interval(),
            stale_after_secs: default_stale_after(),
            in_progress_lease_secs: default_in_progress_lease(),
        }
    }
}

impl SyncConfig {
    pub fn validation_limits(&self) -> ValidationLimits {
        ValidationLimits {
            max_batch_size: self.max_batch_size,
            retention_days: self.retention_days,
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            base_delay: Duration::from_millis(self.base_delay_ms),
        }
    }
}

/// Purge of old terminal batches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HousekeepingConfig {
    /// Delete terminal batches created more than this many days ago; off when unset
    #[serde(default)]
    pub purge_after_days: Option<i64>,
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
}

impl Default for HousekeepingConfig {
    fn default() -> Self {
        Self {
            purge_after_days: None,
            purge_interval_secs: default_purge_interval(),
        }
    }
}
