//! Alert fan-out

use super::channels::{LogChannel, NotificationChannel, SlackChannel};
use super::types::{AlertLedger, AlertStats};
use crate::config::AlertingConfig;
use crate::monitoring::types::Alert;
use crate::utils::error::Result;
use futures::future::join_all;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Records alerts and fans them out to the configured channels
#[derive(Debug)]
pub struct AlertManager {
    enabled: bool,
    ledger: RwLock<AlertLedger>,
    channels: Vec<Arc<dyn NotificationChannel>>,
}

impl AlertManager {
    /// Log channel always; Slack when a webhook is configured
    pub fn new(config: &AlertingConfig) -> Self {
        let mut channels: Vec<Arc<dyn NotificationChannel>> = vec![Arc::new(LogChannel)];

        if let Some(webhook_url) = &config.slack_webhook {
            channels.push(Arc::new(SlackChannel::new(
                webhook_url.clone(),
                config.slack_channel.clone(),
                None,
                config.slack_min_severity,
            )));
        }

        Self::with_channels(config.enabled, channels)
    }

    pub fn with_channels(enabled: bool, channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        Self {
            enabled,
            ledger: RwLock::new(AlertLedger::default()),
            channels,
        }
    }

    /// Record `alert` and deliver it.
    ///
    /// Channel failures are counted and logged; they never fail the caller.
    pub async fn send_alert(&self, alert: Alert) -> Result<()> {
        if !self.enabled {
            debug!(title = %alert.title, "Alerting disabled, alert dropped");
            return Ok(());
        }

        self.ledger.write().record(&alert);

        let alert = &alert;
        let deliveries = self
            .channels
            .iter()
            .filter(|channel| channel.supports_severity(alert.severity))
            .map(|channel| async move {
                channel
                    .send(alert)
                    .await
                    .map_err(|e| (channel.name(), e))
            });

        for result in join_all(deliveries).await {
            if let Err((name, e)) = result {
                warn!(channel = name, "Alert delivery failed: {}", e);
                self.ledger.write().stats.delivery_failures += 1;
            }
        }

        Ok(())
    }

    pub fn stats(&self) -> AlertStats {
        self.ledger.read().stats.clone()
    }

    /// Up to `limit` most recent alerts, oldest first
    pub fn recent_alerts(&self, limit: usize) -> Vec<Alert> {
        let ledger = self.ledger.read();
        let skip = ledger.history.len().saturating_sub(limit);
        ledger.history.iter().skip(skip).cloned().collect()
    }
}
