//! Alerting and pipeline metrics

pub mod alerts;
pub mod metrics;
pub mod types;

pub use alerts::{AlertManager, LogChannel, NotificationChannel, SlackChannel};
pub use metrics::{MetricsSink, MetricsSnapshot, NoopMetrics, SyncMetrics};
pub use types::{Alert, AlertSeverity};
