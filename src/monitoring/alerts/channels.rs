//! Alert sinks

use crate::monitoring::types::{Alert, AlertSeverity};
use crate::utils::error::{Result, SyncError};
use serde_json::json;
use std::time::Duration;
use tracing::{error, info, warn};

/// Destination for alerts
#[async_trait::async_trait]
pub trait NotificationChannel: Send + Sync + std::fmt::Debug {
    async fn send(&self, alert: &Alert) -> Result<()>;

    fn name(&self) -> &str;

    /// Whether alerts of `severity` go to this channel
    fn supports_severity(&self, severity: AlertSeverity) -> bool;
}

/// Writes every alert to the service log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogChannel;

#[async_trait::async_trait]
impl NotificationChannel for LogChannel {
    async fn send(&self, alert: &Alert) -> Result<()> {
        let context = alert
            .context_pairs()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");

        match alert.severity {
            AlertSeverity::Info => info!(source = %alert.source, %context, "{}", alert.description),
            AlertSeverity::Warning => warn!(source = %alert.source, %context, "{}", alert.description),
            AlertSeverity::Critical => {
                error!(source = %alert.source, %context, "{}", alert.description)
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }

    fn supports_severity(&self, _severity: AlertSeverity) -> bool {
        true
    }
}

/// Posts alerts to a Slack incoming webhook
#[derive(Debug)]
pub struct SlackChannel {
    webhook_url: String,
    channel: Option<String>,
    username: String,
    min_severity: AlertSeverity,
    client: reqwest::Client,
}

impl SlackChannel {
    pub fn new(
        webhook_url: String,
        channel: Option<String>,
        username: Option<String>,
        min_severity: AlertSeverity,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                warn!("Slack client falls back to defaults: {}", e);
                reqwest::Client::new()
            });

        Self {
            webhook_url,
            channel,
            username: username.unwrap_or_else(|| "Offline Sync".to_string()),
            min_severity,
            client,
        }
    }

    fn payload(&self, alert: &Alert) -> serde_json::Value {
        let color = match alert.severity {
            AlertSeverity::Info => "good",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Critical => "danger",
        };

        let fields: Vec<_> = alert
            .context_pairs()
            .into_iter()
            .map(|(title, value)| json!({"title": title, "value": value, "short": true}))
            .collect();

        json!({
            "username": self.username,
            "channel": self.channel,
            "attachments": [{
                "color": color,
                "title": alert.title,
                "text": alert.description,
                "fields": fields,
                "footer": alert.source,
                "ts": alert.raised_at.timestamp(),
            }]
        })
    }
}

#[async_trait::async_trait]
impl NotificationChannel for SlackChannel {
    async fn send(&self, alert: &Alert) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&self.payload(alert))
            .send()
            .await
            .map_err(|e| SyncError::Alert(format!("Slack webhook unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Alert(format!("Slack webhook answered {}", status)));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "slack"
    }

    fn supports_severity(&self, severity: AlertSeverity) -> bool {
        severity >= self.min_severity
    }
}
