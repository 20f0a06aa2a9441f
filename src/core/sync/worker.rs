//! Background tasks: queue consumers, dead-letter consumer, sweeps

use super::dead_letter::DeadLetterHandler;
use super::executor::SyncExecutor;
use super::sweeper::RecoverySweeper;
use crate::config::{HousekeepingConfig, SyncConfig};
use crate::queue::{DeadLetter, DeadLetterReason, Delivery, DispatchQueue};
use crate::utils::error::SyncError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Pause after a queue error before consuming again
const QUEUE_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Handling attempts for one dead letter before it goes back to the channel
const DEAD_LETTER_ATTEMPTS: u32 = 3;

/// Task counts and periods
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    pub workers: usize,
    pub sweep_interval: Duration,
    /// Purge period; `None` when the purge is disabled
    pub purge_interval: Option<Duration>,
}

impl WorkerSettings {
    pub fn from_config(sync: &SyncConfig, housekeeping: &HousekeepingConfig) -> Self {
        Self {
            workers: sync.workers,
            sweep_interval: Duration::from_secs(sync.sweep_interval_secs),
            purge_interval: housekeeping
                .purge_after_days
                .map(|_| Duration::from_secs(housekeeping.purge_interval_secs)),
        }
    }
}

/// Running background tasks of the pipeline
pub struct SyncWorkerPool {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl SyncWorkerPool {
    /// Spawn every background task
    pub fn start(
        settings: WorkerSettings,
        queue: Arc<dyn DispatchQueue>,
        executor: Arc<SyncExecutor>,
        dead_letters: Arc<DeadLetterHandler>,
        sweeper: Arc<RecoverySweeper>,
    ) -> Self {
        let (shutdown, signal) = watch::channel(false);
        let mut handles = Vec::with_capacity(settings.workers + 3);

        for id in 0..settings.workers {
            handles.push(tokio::spawn(run_worker(
                id,
                queue.clone(),
                executor.clone(),
                signal.clone(),
            )));
        }

        handles.push(tokio::spawn(run_dead_letters(
            queue.clone(),
            dead_letters,
            signal.clone(),
        )));

        handles.push(tokio::spawn(run_sweeps(
            sweeper.clone(),
            settings.sweep_interval,
            signal.clone(),
        )));

        if let Some(period) = settings.purge_interval {
            handles.push(tokio::spawn(run_purges(sweeper, period, signal)));
        }

        info!(workers = settings.workers, "Sync workers started");
        Self { shutdown, handles }
    }

    /// Number of spawned tasks
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Ask every task to stop and wait for them; in-flight batches finish first
    pub async fn shutdown(self) {
        info!("Stopping sync workers");
        let _ = self.shutdown.send(true);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Sync task ended abnormally: {}", e);
            }
        }
        info!("Sync workers stopped");
    }
}

async fn run_worker(
    id: usize,
    queue: Arc<dyn DispatchQueue>,
    executor: Arc<SyncExecutor>,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(worker = id, "Worker started");

    while !*shutdown.borrow() {
        let delivery = tokio::select! {
            _ = shutdown.changed() => break,
            delivery = queue.consume() => delivery,
        };

        match delivery {
            Ok(delivery) => handle_delivery(id, queue.as_ref(), &executor, delivery).await,
            Err(e) => {
                error!(worker = id, error = %e, "Queue consume failed");
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(QUEUE_ERROR_BACKOFF) => {}
                }
            }
        }
    }

    debug!(worker = id, "Worker stopped");
}

async fn handle_delivery(
    id: usize,
    queue: &dyn DispatchQueue,
    executor: &SyncExecutor,
    delivery: Delivery,
) {
    let message = delivery.message();

    match executor.execute(message).await {
        Ok(outcome) => debug!(worker = id, batch_id = %message.batch_id, ?outcome, "Message handled"),
        Err(SyncError::BatchNotFound(batch_id)) => {
            error!(worker = id, batch_id = %batch_id, "Message references an unknown batch");
            if let Err(e) = queue
                .dead_letter(
                    message.clone(),
                    DeadLetterReason::Unprocessable("batch not found".to_string()),
                )
                .await
            {
                error!(worker = id, error = %e, "Failed to dead-letter message");
            }
        }
        // The batch stays where it is; the recovery sweep picks it up later.
        Err(e) => error!(worker = id, batch_id = %message.batch_id, error = %e, "Message processing failed"),
    }

    if let Err(e) = queue.ack(&delivery).await {
        warn!(worker = id, error = %e, "Failed to ack delivery");
    }
}

async fn run_dead_letters(
    queue: Arc<dyn DispatchQueue>,
    handler: Arc<DeadLetterHandler>,
    mut shutdown: watch::Receiver<bool>,
) {
    while !*shutdown.borrow() {
        let entry = tokio::select! {
            _ = shutdown.changed() => break,
            entry = queue.consume_dead_letter() => entry,
        };

        match entry {
            Ok(entry) => {
                process_dead_letter(queue.as_ref(), &handler, entry, QUEUE_ERROR_BACKOFF).await
            }
            Err(e) => {
                error!(error = %e, "Dead-letter consume failed");
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = tokio::time::sleep(QUEUE_ERROR_BACKOFF) => {}
                }
            }
        }
    }
}

/// Handle `entry`, retrying a few times. An entry that still fails is put
/// back on the dead-letter channel so it is not lost.
pub(crate) async fn process_dead_letter(
    queue: &dyn DispatchQueue,
    handler: &DeadLetterHandler,
    entry: DeadLetter,
    backoff: Duration,
) {
    for attempt in 1..=DEAD_LETTER_ATTEMPTS {
        match handler.handle(entry.clone()).await {
            Ok(()) => return,
            Err(e) => {
                warn!(
                    batch_id = %entry.message.batch_id,
                    attempt,
                    error = %e,
                    "Dead-letter handling failed"
                );
                if attempt < DEAD_LETTER_ATTEMPTS {
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    let batch_id = entry.message.batch_id.clone();
    if let Err(e) = queue.dead_letter(entry.message, entry.reason).await {
        error!(batch_id = %batch_id, error = %e, "Dead letter dropped");
    } else {
        warn!(batch_id = %batch_id, "Dead letter returned to the channel");
    }
}

async fn run_sweeps(
    sweeper: Arc<RecoverySweeper>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    while !*shutdown.borrow() {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                if let Err(e) = sweeper.sweep().await {
                    error!(error = %e, "Recovery sweep failed");
                }
            }
        }
    }
}

async fn run_purges(
    sweeper: Arc<RecoverySweeper>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    while !*shutdown.borrow() {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                if let Err(e) = sweeper.purge().await {
                    error!(error = %e, "Purge failed");
                }
            }
        }
    }
}
