//! Backoff policy for requeued batches

mod retry;
mod types;

pub use retry::RetryPolicy;
pub use types::RetryConfig;
