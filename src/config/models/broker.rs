//! Dispatch queue configuration

use super::*;
use serde::{Deserialize, Serialize};

/// Queue implementation backing the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrokerBackend {
    /// In-process channels; messages do not survive a restart
    #[default]
    Memory,
    /// Redis lists
    Redis,
}

/// Broker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default)]
    pub backend: BrokerBackend,
    /// Key prefix for the queue, processing and dead-letter lists
    #[serde(default = "default_queue_prefix")]
    pub queue_prefix: String,
    /// Seconds a message may wait before it is dead-lettered
    #[serde(default = "default_message_ttl")]
    pub message_ttl_secs: u64,
    /// Poll interval for the Redis backend
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            backend: BrokerBackend::default(),
            queue_prefix: default_queue_prefix(),
            message_ttl_secs: default_message_ttl(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl BrokerConfig {
    pub fn queue_key(&self) -> String {
        format!("{}.queue", self.queue_prefix)
    }

    pub fn processing_key(&self) -> String {
        format!("{}.processing", self.queue_prefix)
    }

    pub fn dead_letter_key(&self) -> String {
        format!("{}.dlq", self.queue_prefix)
    }
}
