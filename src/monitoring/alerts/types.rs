//! Alert bookkeeping

use crate::monitoring::types::Alert;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// Alerts kept in memory for inspection
pub(super) const HISTORY_LIMIT: usize = 500;

/// Counters exposed on the metrics endpoint
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct AlertStats {
    pub raised: u64,
    pub by_severity: BTreeMap<String, u64>,
    pub by_source: BTreeMap<String, u64>,
    /// Channel deliveries that failed
    pub delivery_failures: u64,
    pub last_raised_at: Option<DateTime<Utc>>,
}

/// History and counters behind one lock
#[derive(Debug, Default)]
pub(super) struct AlertLedger {
    pub history: VecDeque<Alert>,
    pub stats: AlertStats,
}

impl AlertLedger {
    pub fn record(&mut self, alert: &Alert) {
        self.stats.raised += 1;
        *self
            .stats
            .by_severity
            .entry(alert.severity.as_str().to_string())
            .or_default() += 1;
        *self.stats.by_source.entry(alert.source.clone()).or_default() += 1;
        self.stats.last_raised_at = Some(alert.raised_at);

        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(alert.clone());
    }
}
