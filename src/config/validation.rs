//! Configuration validation

use super::models::*;
use crate::utils::error::{Result, SyncError};
use tracing::{debug, warn};

/// Longest accepted pointage retention, in days
pub const MAX_RETENTION_DAYS: i64 = 3650;

/// Longest accepted purge age, in days
pub const MAX_PURGE_AFTER_DAYS: i64 = 3650;

/// Upper bound for the stale and in-progress reclaim windows
pub const MAX_RECLAIM_WINDOW_SECS: u64 = 7 * 24 * 3600;

/// Validation trait for configuration structures
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        debug!("Validating service configuration");

        self.server.validate()?;
        self.storage.validate()?;
        self.broker.validate()?;
        self.downstream.validate()?;
        self.sync.validate()?;
        self.housekeeping.validate()?;
        self.alerting.validate()?;

        let call_budget = self
            .downstream
            .timeout_secs
            .saturating_add(self.downstream.connect_timeout_secs);
        if self.sync.in_progress_lease_secs <= call_budget {
            return Err(SyncError::Config(format!(
                "in_progress_lease_secs ({}) must exceed the downstream timeout plus connect timeout ({})",
                self.sync.in_progress_lease_secs, call_budget
            )));
        }

        if self.sync.stale_after_secs <= self.broker.message_ttl_secs {
            warn!(
                "stale_after_secs ({}) does not exceed the message TTL ({}); live messages may be reclaimed",
                self.sync.stale_after_secs, self.broker.message_ttl_secs
            );
        }

        Ok(())
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(SyncError::Config("Server port cannot be 0".to_string()));
        }
        if self.host.is_empty() {
            return Err(SyncError::Config("Server host cannot be empty".to_string()));
        }
        if self.workers == Some(0) {
            return Err(SyncError::Config("Server workers must be positive".to_string()));
        }
        Ok(())
    }
}

impl Validate for StorageConfig {
    fn validate(&self) -> Result<()> {
        if self.database.enabled {
            if self.database.url.is_empty() {
                return Err(SyncError::Config("Database URL cannot be empty".to_string()));
            }
            if self.database.max_connections == 0 {
                return Err(SyncError::Config(
                    "Database max_connections must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Validate for BrokerConfig {
    fn validate(&self) -> Result<()> {
        if self.queue_prefix.is_empty() {
            return Err(SyncError::Config("Queue prefix cannot be empty".to_string()));
        }
        if self.message_ttl_secs == 0 {
            return Err(SyncError::Config("Message TTL must be positive".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(SyncError::Config("Poll interval must be positive".to_string()));
        }
        #[cfg(not(feature = "redis"))]
        if self.backend == BrokerBackend::Redis {
            return Err(SyncError::Config(
                "Redis broker requested but the redis feature is disabled".to_string(),
            ));
        }
        Ok(())
    }
}

impl Validate for DownstreamConfig {
    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| SyncError::Config(format!("Invalid pointage service URL: {}", e)))?;

        if self.timeout_secs == 0 {
            return Err(SyncError::Config("Downstream timeout must be positive".to_string()));
        }
        if self.success_markers.iter().all(|m| m.trim().is_empty()) {
            return Err(SyncError::Config(
                "At least one success marker must be configured".to_string(),
            ));
        }
        Ok(())
    }
}

impl Validate for SyncConfig {
    fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            return Err(SyncError::Config("max_batch_size must be positive".to_string()));
        }
        if !(1..=MAX_RETENTION_DAYS).contains(&self.retention_days) {
            return Err(SyncError::Config(format!(
                "retention_days must be between 1 and {}, got {}",
                MAX_RETENTION_DAYS, self.retention_days
            )));
        }
        if !(1..=64).contains(&self.workers) {
            return Err(SyncError::Config(format!(
                "workers must be between 1 and 64, got {}",
                self.workers
            )));
        }
        if self.sweep_interval_secs == 0 {
            return Err(SyncError::Config("sweep_interval_secs must be positive".to_string()));
        }
        for (name, secs) in [
            ("stale_after_secs", self.stale_after_secs),
            ("in_progress_lease_secs", self.in_progress_lease_secs),
        ] {
            if !(1..=MAX_RECLAIM_WINDOW_SECS).contains(&secs) {
                return Err(SyncError::Config(format!(
                    "{} must be between 1 and {}, got {}",
                    name, MAX_RECLAIM_WINDOW_SECS, secs
                )));
            }
        }
        Ok(())
    }
}

impl Validate for HousekeepingConfig {
    fn validate(&self) -> Result<()> {
        if let Some(days) = self.purge_after_days {
            if !(1..=MAX_PURGE_AFTER_DAYS).contains(&days) {
                return Err(SyncError::Config(format!(
                    "purge_after_days must be between 1 and {}, got {}",
                    MAX_PURGE_AFTER_DAYS, days
                )));
            }
        }
        if self.purge_interval_secs == 0 {
            return Err(SyncError::Config("purge_interval_secs must be positive".to_string()));
        }
        Ok(())
    }
}

impl Validate for AlertingConfig {
    fn validate(&self) -> Result<()> {
        if let Some(webhook) = &self.slack_webhook {
            url::Url::parse(webhook)
                .map_err(|e| SyncError::Config(format!("Invalid Slack webhook URL: {}", e)))?;
        }
        Ok(())
    }
}
