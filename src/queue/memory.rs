//! In-process queue on tokio channels
//!
//! Messages live only as long as the process. Delivery is at-most-once
//! across restarts; the recovery sweep republishes batches whose message
//! was lost.

use super::{DeadLetter, DeadLetterReason, Delivery, DispatchQueue, Envelope};
use crate::core::sync::types::DispatchMessage;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

/// Queue backed by unbounded tokio channels
#[derive(Debug)]
pub struct InMemoryQueue {
    ttl: Duration,
    queue_tx: mpsc::UnboundedSender<Envelope>,
    queue_rx: Mutex<mpsc::UnboundedReceiver<Envelope>>,
    dead_tx: mpsc::UnboundedSender<DeadLetter>,
    dead_rx: Mutex<mpsc::UnboundedReceiver<DeadLetter>>,
    depth: AtomicU64,
}

impl InMemoryQueue {
    /// Create a queue whose messages expire after `ttl`
    pub fn new(ttl: std::time::Duration) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();

        Self {
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::hours(1)),
            queue_tx,
            queue_rx: Mutex::new(queue_rx),
            dead_tx,
            dead_rx: Mutex::new(dead_rx),
            depth: AtomicU64::new(0),
        }
    }

    fn push(&self, envelope: Envelope) -> Result<()> {
        self.depth.fetch_add(1, Ordering::Relaxed);
        self.queue_tx.send(envelope).map_err(|_| {
            self.decrement_depth();
            SyncError::queue("in-memory queue is closed")
        })
    }

    fn decrement_depth(&self) {
        let _ = self
            .depth
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |d| Some(d.saturating_sub(1)));
    }

    /// Enqueue an already built envelope; lets tests control expiry
    pub fn publish_envelope(&self, envelope: Envelope) -> Result<()> {
        self.push(envelope)
    }
}

#[async_trait]
impl DispatchQueue for InMemoryQueue {
    async fn publish(&self, message: DispatchMessage) -> Result<()> {
        debug!(batch_id = %message.batch_id, retry_count = message.retry_count, "Publishing");
        self.push(Envelope::new(message, self.ttl, Utc::now()))
    }

    async fn consume(&self) -> Result<Delivery> {
        let mut rx = self.queue_rx.lock().await;

        loop {
            let envelope = rx
                .recv()
                .await
                .ok_or_else(|| SyncError::queue("in-memory queue is closed"))?;
            self.decrement_depth();

            if envelope.is_expired(Utc::now()) {
                warn!(batch_id = %envelope.message.batch_id, "Message expired in queue");
                self.dead_letter(envelope.message, DeadLetterReason::Expired)
                    .await?;
                continue;
            }

            return Ok(Delivery {
                envelope,
                receipt: String::new(),
            });
        }
    }

    async fn ack(&self, _delivery: &Delivery) -> Result<()> {
        Ok(())
    }

    async fn dead_letter(&self, message: DispatchMessage, reason: DeadLetterReason) -> Result<()> {
        debug!(batch_id = %message.batch_id, %reason, "Dead-lettering");
        self.dead_tx
            .send(DeadLetter {
                message,
                reason,
                dead_lettered_at: Utc::now(),
            })
            .map_err(|_| SyncError::queue("in-memory dead-letter queue is closed"))
    }

    async fn consume_dead_letter(&self) -> Result<DeadLetter> {
        self.dead_rx
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| SyncError::queue("in-memory dead-letter queue is closed"))
    }

    async fn depth(&self) -> Result<Option<u64>> {
        Ok(Some(self.depth.load(Ordering::Relaxed)))
    }
}
