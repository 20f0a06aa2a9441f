//! Error handling for the sync service
//!
//! This module defines the crate-wide error type, its HTTP mapping and the
//! backoff policy used when a batch has to be requeued.

pub mod recovery;
mod response;
mod types;

pub use recovery::{RetryConfig, RetryPolicy};
pub use response::{ErrorDetail, ErrorResponse};
pub use types::{Result, SyncError};
