//! Dispatch queue
//!
//! At-least-once delivery of [`DispatchMessage`]s with a per-message TTL and
//! a dead-letter channel. Messages that outlive their TTL before a worker
//! picks them up are moved to the dead-letter channel with
//! [`DeadLetterReason::Expired`] instead of being delivered.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::InMemoryQueue;
#[cfg(feature = "redis")]
pub use self::redis::RedisQueue;

use crate::core::sync::types::DispatchMessage;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A message as stored in the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub message: DispatchMessage,
    pub enqueued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Envelope {
    pub fn new(message: DispatchMessage, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            message,
            enqueued_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A message handed to a worker; must be acked once handled
#[derive(Debug, Clone)]
pub struct Delivery {
    pub envelope: Envelope,
    /// Backend handle used to acknowledge the delivery
    pub(crate) receipt: String,
}

impl Delivery {
    pub fn message(&self) -> &DispatchMessage {
        &self.envelope.message
    }
}

/// Why a message left the main queue for good
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum DeadLetterReason {
    /// The retry budget is spent
    RetriesExhausted,
    /// The message outlived its TTL in the queue
    Expired,
    /// The message cannot be processed at all
    Unprocessable(String),
}

impl fmt::Display for DeadLetterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetriesExhausted => write!(f, "retries exhausted"),
            Self::Expired => write!(f, "message expired in queue"),
            Self::Unprocessable(detail) => write!(f, "unprocessable: {}", detail),
        }
    }
}

/// Entry of the dead-letter channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub message: DispatchMessage,
    pub reason: DeadLetterReason,
    pub dead_lettered_at: DateTime<Utc>,
}

/// Durable broker seen by the pipeline
#[async_trait]
pub trait DispatchQueue: Send + Sync {
    async fn publish(&self, message: DispatchMessage) -> Result<()>;

    /// Wait for the next live message
    async fn consume(&self) -> Result<Delivery>;

    /// Remove a handled delivery for good
    async fn ack(&self, delivery: &Delivery) -> Result<()>;

    async fn dead_letter(&self, message: DispatchMessage, reason: DeadLetterReason) -> Result<()>;

    /// Wait for the next dead letter
    async fn consume_dead_letter(&self) -> Result<DeadLetter>;

    /// Messages waiting in the main queue, when the backend knows
    async fn depth(&self) -> Result<Option<u64>>;
}
