//! Exponential backoff without jitter

use super::types::RetryConfig;
use std::time::Duration;

/// Highest exponent applied to the base delay
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Exponential backoff policy
///
/// The delay before requeue `n` (0-based) is `base_delay * 2^n`, so the
/// default policy waits 2s, 4s then 8s.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Delay to wait before publishing retry number `retry_count`
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let factor = 1u32 << retry_count.min(MAX_BACKOFF_EXPONENT);
        self.config.base_delay.saturating_mul(factor)
    }

    /// Whether another requeue fits in the budget
    pub fn should_retry(&self, retry_count: u32, max_retries: u32) -> bool {
        retry_count < max_retries
    }
}
