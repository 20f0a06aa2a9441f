//! Pipeline counters

use crate::core::sync::types::{BatchKind, SyncStatus};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Receiver for pipeline events
pub trait MetricsSink: Send + Sync + std::fmt::Debug {
    fn batch_received(&self, kind: BatchKind);
    fn batch_rejected(&self);
    fn batch_published(&self);
    fn publish_failed(&self);
    /// A batch reached a terminal status
    fn batch_finished(&self, status: SyncStatus);
    fn retry_scheduled(&self);
    fn dead_lettered(&self);
    fn downstream_call(&self, elapsed: Duration, success: bool);
    fn snapshot(&self) -> MetricsSnapshot;
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub received_standard: u64,
    pub received_terrain: u64,
    pub rejected: u64,
    pub published: u64,
    pub publish_failures: u64,
    pub completed: u64,
    pub partial_failures: u64,
    pub failed: u64,
    pub retries: u64,
    pub dead_lettered: u64,
    pub downstream_calls: u64,
    pub downstream_errors: u64,
    pub downstream_avg_latency_ms: f64,
}

/// Lock-free counters
#[derive(Debug, Default)]
pub struct SyncMetrics {
    received_standard: AtomicU64,
    received_terrain: AtomicU64,
    rejected: AtomicU64,
    published: AtomicU64,
    publish_failures: AtomicU64,
    completed: AtomicU64,
    partial_failures: AtomicU64,
    failed: AtomicU64,
    retries: AtomicU64,
    dead_lettered: AtomicU64,
    downstream_calls: AtomicU64,
    downstream_errors: AtomicU64,
    downstream_latency_us: AtomicU64,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetricsSink for SyncMetrics {
    fn batch_received(&self, kind: BatchKind) {
        match kind {
            BatchKind::Standard => self.received_standard.fetch_add(1, Ordering::Relaxed),
            BatchKind::Terrain => self.received_terrain.fetch_add(1, Ordering::Relaxed),
        };
    }

    fn batch_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    fn batch_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    fn publish_failed(&self) {
        self.publish_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn batch_finished(&self, status: SyncStatus) {
        let counter = match status {
            SyncStatus::Completed => &self.completed,
            SyncStatus::PartialFailure => &self.partial_failures,
            SyncStatus::Failed => &self.failed,
            _ => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn retry_scheduled(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    fn dead_lettered(&self) {
        self.dead_lettered.fetch_add(1, Ordering::Relaxed);
    }

    fn downstream_call(&self, elapsed: Duration, success: bool) {
        self.downstream_calls.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.downstream_errors.fetch_add(1, Ordering::Relaxed);
        }
        self.downstream_latency_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MetricsSnapshot {
        let calls = self.downstream_calls.load(Ordering::Relaxed);
        let latency_us = self.downstream_latency_us.load(Ordering::Relaxed);

        MetricsSnapshot {
            received_standard: self.received_standard.load(Ordering::Relaxed),
            received_terrain: self.received_terrain.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            partial_failures: self.partial_failures.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
            downstream_calls: calls,
            downstream_errors: self.downstream_errors.load(Ordering::Relaxed),
            downstream_avg_latency_ms: if calls == 0 {
                0.0
            } else {
                latency_us as f64 / calls as f64 / 1000.0
            },
        }
    }
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn batch_received(&self, _kind: BatchKind) {}
    fn batch_rejected(&self) {}
    fn batch_published(&self) {}
    fn publish_failed(&self) {}
    fn batch_finished(&self, _status: SyncStatus) {}
    fn retry_scheduled(&self) {}
    fn dead_lettered(&self) {}
    fn downstream_call(&self, _elapsed: Duration, _success: bool) {}

    fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::default()
    }
}
