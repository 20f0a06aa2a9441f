//! Redis list broker
//!
//! Messages are pushed on the left of the queue list and moved atomically
//! into a processing list when a worker picks them up. Ack removes the
//! processing entry, so a crash between pickup and ack leaves the message
//! in the processing list for [`RedisQueue::recover_in_flight`].

use super::{DeadLetter, DeadLetterReason, Delivery, DispatchQueue, Envelope};
use crate::config::BrokerConfig;
use crate::core::sync::types::DispatchMessage;
use crate::storage::redis::RedisPool;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use redis::AsyncCommands;
use tracing::{debug, info, warn};

/// Queue stored in three Redis lists
#[derive(Debug, Clone)]
pub struct RedisQueue {
    pool: RedisPool,
    queue_key: String,
    processing_key: String,
    dead_letter_key: String,
    ttl: Duration,
    poll_interval: std::time::Duration,
}

impl RedisQueue {
    pub fn new(pool: RedisPool, config: &BrokerConfig) -> Self {
        Self {
            pool,
            queue_key: config.queue_key(),
            processing_key: config.processing_key(),
            dead_letter_key: config.dead_letter_key(),
            ttl: Duration::seconds(config.message_ttl_secs as i64),
            poll_interval: std::time::Duration::from_millis(config.poll_interval_ms),
        }
    }

    /// Put messages left in the processing list back on the queue.
    ///
    /// Only safe while no worker of this queue is running.
    pub async fn recover_in_flight(&self) -> Result<u64> {
        let mut conn = self.pool.connection();
        let mut moved = 0u64;

        loop {
            let item: Option<String> = conn
                .rpoplpush(&self.processing_key, &self.queue_key)
                .await
                .map_err(SyncError::Redis)?;
            if item.is_none() {
                break;
            }
            moved += 1;
        }

        if moved > 0 {
            info!(moved, "Requeued in-flight messages");
        }
        Ok(moved)
    }

    async fn remove_processing(&self, raw: &str) -> Result<()> {
        let mut conn = self.pool.connection();
        let _: i64 = conn
            .lrem(&self.processing_key, 1, raw)
            .await
            .map_err(SyncError::Redis)?;
        Ok(())
    }
}

#[async_trait]
impl DispatchQueue for RedisQueue {
    async fn publish(&self, message: DispatchMessage) -> Result<()> {
        let envelope = Envelope::new(message, self.ttl, Utc::now());
        let raw = serde_json::to_string(&envelope)?;

        let mut conn = self.pool.connection();
        let _: i64 = conn
            .lpush(&self.queue_key, raw)
            .await
            .map_err(SyncError::Redis)?;

        debug!(batch_id = %envelope.message.batch_id, "Published to Redis");
        Ok(())
    }

    async fn consume(&self) -> Result<Delivery> {
        loop {
            let mut conn = self.pool.connection();
            let raw: Option<String> = conn
                .rpoplpush(&self.queue_key, &self.processing_key)
                .await
                .map_err(SyncError::Redis)?;

            let Some(raw) = raw else {
                tokio::time::sleep(self.poll_interval).await;
                continue;
            };

            let envelope: Envelope = match serde_json::from_str(&raw) {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!(error = %e, "Dropping undecodable queue entry");
                    self.remove_processing(&raw).await?;
                    continue;
                }
            };

            if envelope.is_expired(Utc::now()) {
                warn!(batch_id = %envelope.message.batch_id, "Message expired in queue");
                self.dead_letter(envelope.message, DeadLetterReason::Expired)
                    .await?;
                self.remove_processing(&raw).await?;
                continue;
            }

            return Ok(Delivery {
                envelope,
                receipt: raw,
            });
        }
    }

    async fn ack(&self, delivery: &Delivery) -> Result<()> {
        self.remove_processing(&delivery.receipt).await
    }

    async fn dead_letter(&self, message: DispatchMessage, reason: DeadLetterReason) -> Result<()> {
        let entry = DeadLetter {
            message,
            reason,
            dead_lettered_at: Utc::now(),
        };
        let raw = serde_json::to_string(&entry)?;

        let mut conn = self.pool.connection();
        let _: i64 = conn
            .lpush(&self.dead_letter_key, raw)
            .await
            .map_err(SyncError::Redis)?;
        Ok(())
    }

    async fn consume_dead_letter(&self) -> Result<DeadLetter> {
        loop {
            let mut conn = self.pool.connection();
            let raw: Option<String> = conn
                .rpop(&self.dead_letter_key, None)
                .await
                .map_err(SyncError::Redis)?;

            match raw {
                Some(raw) => match serde_json::from_str(&raw) {
                    Ok(entry) => return Ok(entry),
                    Err(e) => warn!(error = %e, "Dropping undecodable dead letter"),
                },
                None => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }

    async fn depth(&self) -> Result<Option<u64>> {
        let mut conn = self.pool.connection();
        let len: u64 = conn
            .llen(&self.queue_key)
            .await
            .map_err(SyncError::Redis)?;
        Ok(Some(len))
    }
}
