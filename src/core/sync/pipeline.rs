//! Wiring of the sync components

use super::dead_letter::DeadLetterHandler;
use super::executor::{ExecutorSettings, SyncExecutor};
use super::retry::RetryController;
use super::service::SyncService;
use super::sweeper::{RecoverySweeper, SweepSettings};
use super::validation::Validator;
use super::worker::{SyncWorkerPool, WorkerSettings};
use crate::config::validation::{MAX_PURGE_AFTER_DAYS, MAX_RECLAIM_WINDOW_SECS};
use crate::config::{BrokerBackend, Config};
use crate::core::downstream::{HttpPointageClient, PointageClient};
use crate::monitoring::{AlertManager, MetricsSink, SyncMetrics};
use crate::queue::{DispatchQueue, InMemoryQueue};
use crate::storage::{self, BatchRegistry};
use crate::utils::error::{Result, RetryPolicy};
use chrono::Duration;
use std::sync::Arc;
use tracing::info;

/// Every component of the pipeline, built once at startup
pub struct SyncPipeline {
    registry: Arc<dyn BatchRegistry>,
    queue: Arc<dyn DispatchQueue>,
    metrics: Arc<dyn MetricsSink>,
    alerts: Arc<AlertManager>,
    service: Arc<SyncService>,
    executor: Arc<SyncExecutor>,
    dead_letters: Arc<DeadLetterHandler>,
    sweeper: Arc<RecoverySweeper>,
    worker_settings: WorkerSettings,
}

impl SyncPipeline {
    /// Compose the pipeline around the given adapters
    pub fn new(
        config: &Config,
        registry: Arc<dyn BatchRegistry>,
        queue: Arc<dyn DispatchQueue>,
        client: Arc<dyn PointageClient>,
        alerts: Arc<AlertManager>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let sync = config.sync();
        let downstream = config.downstream();

        let retry = Arc::new(RetryController::new(
            registry.clone(),
            queue.clone(),
            RetryPolicy::new(sync.retry_config()),
            metrics.clone(),
        ));

        let executor = Arc::new(SyncExecutor::new(
            registry.clone(),
            client,
            retry,
            metrics.clone(),
            ExecutorSettings::from(downstream),
        ));

        let service = Arc::new(SyncService::new(
            registry.clone(),
            queue.clone(),
            Validator::new(sync.validation_limits()),
            metrics.clone(),
            sync.max_retries,
            downstream.success_markers.clone(),
        ));

        let dead_letters = Arc::new(DeadLetterHandler::new(
            registry.clone(),
            alerts.clone(),
            metrics.clone(),
        ));

        let sweeper = Arc::new(RecoverySweeper::new(
            registry.clone(),
            queue.clone(),
            metrics.clone(),
            SweepSettings {
                stale_after: reclaim_window(sync.stale_after_secs),
                in_progress_lease: reclaim_window(sync.in_progress_lease_secs),
                purge_after: config
                    .housekeeping()
                    .purge_after_days
                    .map(|days| Duration::days(days.clamp(1, MAX_PURGE_AFTER_DAYS))),
            },
        ));

        Self {
            registry,
            queue,
            metrics,
            alerts,
            service,
            executor,
            dead_letters,
            sweeper,
            worker_settings: WorkerSettings::from_config(sync, config.housekeeping()),
        }
    }

    /// Connect the configured registry, broker and pointage client
    pub async fn from_config(config: &Config) -> Result<Self> {
        let registry = storage::connect_registry(&config.storage().database).await?;
        let queue = connect_queue(config).await?;
        let client: Arc<dyn PointageClient> =
            Arc::new(HttpPointageClient::new(config.downstream())?);
        let alerts = Arc::new(AlertManager::new(config.alerting()));
        let metrics: Arc<dyn MetricsSink> = Arc::new(SyncMetrics::new());

        Ok(Self::new(config, registry, queue, client, alerts, metrics))
    }

    /// Spawn the workers, the dead-letter consumer and the sweeps
    pub fn start_workers(&self) -> SyncWorkerPool {
        SyncWorkerPool::start(
            self.worker_settings,
            self.queue.clone(),
            self.executor.clone(),
            self.dead_letters.clone(),
            self.sweeper.clone(),
        )
    }

    pub fn service(&self) -> Arc<SyncService> {
        self.service.clone()
    }

    pub fn executor(&self) -> Arc<SyncExecutor> {
        self.executor.clone()
    }

    pub fn dead_letters(&self) -> Arc<DeadLetterHandler> {
        self.dead_letters.clone()
    }

    pub fn sweeper(&self) -> Arc<RecoverySweeper> {
        self.sweeper.clone()
    }

    pub fn registry(&self) -> Arc<dyn BatchRegistry> {
        self.registry.clone()
    }

    pub fn queue(&self) -> Arc<dyn DispatchQueue> {
        self.queue.clone()
    }

    pub fn metrics(&self) -> Arc<dyn MetricsSink> {
        self.metrics.clone()
    }

    pub fn alerts(&self) -> Arc<AlertManager> {
        self.alerts.clone()
    }
}

async fn connect_queue(config: &Config) -> Result<Arc<dyn DispatchQueue>> {
    let broker = config.broker();
    match broker.backend {
        BrokerBackend::Memory => {
            info!("Using in-memory dispatch queue");
            Ok(Arc::new(InMemoryQueue::new(std::time::Duration::from_secs(
                broker.message_ttl_secs,
            ))))
        }
        #[cfg(feature = "redis")]
        BrokerBackend::Redis => {
            use crate::queue::RedisQueue;
            use crate::storage::redis::RedisPool;

            info!("Using Redis dispatch queue");
            let pool = RedisPool::new(&config.storage().redis).await?;
            let queue = RedisQueue::new(pool, broker);
            queue.recover_in_flight().await?;
            Ok(Arc::new(queue))
        }
        #[cfg(not(feature = "redis"))]
        BrokerBackend::Redis => Err(crate::utils::error::SyncError::config(
            "redis broker requires the `redis` feature",
        )),
    }
}

fn reclaim_window(secs: u64) -> Duration {
    Duration::seconds(secs.min(MAX_RECLAIM_WINDOW_SECS) as i64)
}
