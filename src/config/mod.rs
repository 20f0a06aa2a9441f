//! Configuration management for the sync service
//!
//! Configuration is read from a YAML file, overlaid with environment
//! variables, then validated section by section.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{Result, SyncError};
use std::path::Path;
use tracing::{debug, info};

/// Main configuration struct for the service
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub service: ServiceConfig,
}

impl Config {
    /// Load configuration from a YAML file, then apply environment overrides
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SyncError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::from_yaml(&content)?;
        config.apply_env();
        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Parse a YAML document without touching the environment
    pub fn from_yaml(content: &str) -> Result<Self> {
        let service: ServiceConfig = serde_yaml::from_str(content)
            .map_err(|e| SyncError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(Self { service })
    }

    /// Build configuration from defaults and environment variables
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay values from `lookup`; unparsable numbers are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let svc = &mut self.service;

        if let Some(host) = lookup("SYNC_SERVER_HOST") {
            svc.server.host = host;
        }
        if let Some(port) = lookup("SYNC_SERVER_PORT").and_then(|v| v.parse().ok()) {
            svc.server.port = port;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            svc.storage.database.url = url;
            svc.storage.database.enabled = true;
        }
        if let Some(url) = lookup("REDIS_URL") {
            svc.storage.redis.url = url;
        }
        if let Some(backend) = lookup("SYNC_BROKER_BACKEND") {
            match backend.to_ascii_lowercase().as_str() {
                "redis" => svc.broker.backend = BrokerBackend::Redis,
                "memory" => svc.broker.backend = BrokerBackend::Memory,
                other => debug!("Ignoring unknown broker backend: {}", other),
            }
        }
        if let Some(url) = lookup("POINTAGE_SERVICE_URL") {
            svc.downstream.base_url = url;
        }
        if let Some(workers) = lookup("SYNC_WORKERS").and_then(|v| v.parse().ok()) {
            svc.sync.workers = workers;
        }
        if let Some(retries) = lookup("SYNC_MAX_RETRIES").and_then(|v| v.parse().ok()) {
            svc.sync.max_retries = retries;
        }
        if let Some(webhook) = lookup("SLACK_WEBHOOK_URL") {
            svc.alerting.slack_webhook = Some(webhook);
        }
    }

    pub fn server(&self) -> &ServerConfig {
        &self.service.server
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.service.storage
    }

    pub fn broker(&self) -> &BrokerConfig {
        &self.service.broker
    }

    pub fn downstream(&self) -> &DownstreamConfig {
        &self.service.downstream
    }

    pub fn sync(&self) -> &SyncConfig {
        &self.service.sync
    }

    pub fn housekeeping(&self) -> &HousekeepingConfig {
        &self.service.housekeeping
    }

    pub fn alerting(&self) -> &AlertingConfig {
        &self.service.alerting
    }

    pub fn logging(&self) -> &LoggingConfig {
        &self.service.logging
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");
        self.service.validate()
    }
}
