//! Utility modules
//!
//! - **error**: crate error type, HTTP mapping and backoff policy
//! - **logging**: tracing subscriber setup
//! - **shutdown**: bounded cleanup on shutdown

pub mod error;
pub mod logging;
pub mod shutdown;
