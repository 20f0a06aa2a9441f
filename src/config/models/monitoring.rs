//! Logging and alerting configuration

use super::*;
use crate::monitoring::AlertSeverity;
use serde::{Deserialize, Serialize};

/// Alerting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertingConfig {
    /// Enable alerting
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Slack webhook URL
    #[serde(default)]
    pub slack_webhook: Option<String>,
    /// Slack channel override
    #[serde(default)]
    pub slack_channel: Option<String>,
    /// Lowest severity forwarded to Slack
    #[serde(default = "default_slack_severity")]
    pub slack_min_severity: AlertSeverity,
}

fn default_slack_severity() -> AlertSeverity {
    AlertSeverity::Warning
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            slack_webhook: None,
            slack_channel: None,
            slack_min_severity: default_slack_severity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
