//! Graceful shutdown helpers

use crate::utils::error::{Result, SyncError};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error};

/// Bounded cleanup after a shutdown signal
#[derive(Debug, Clone, Copy)]
pub struct GracefulShutdown {
    shutdown_timeout: Duration,
}

impl GracefulShutdown {
    pub fn new(shutdown_timeout: Duration) -> Self {
        Self { shutdown_timeout }
    }

    /// Wait for Ctrl+C
    pub async fn wait_for_signal(&self) -> Result<()> {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| SyncError::internal(format!("Failed to listen for shutdown signal: {}", e)))?;
        debug!("Shutdown signal received");
        Ok(())
    }

    /// Run `cleanup`, giving up after the shutdown timeout
    pub async fn drain<Fut>(&self, cleanup: Fut) -> Result<()>
    where
        Fut: Future<Output = ()>,
    {
        match timeout(self.shutdown_timeout, cleanup).await {
            Ok(()) => {
                debug!("Graceful shutdown completed");
                Ok(())
            }
            Err(_) => {
                error!("Graceful shutdown timed out after {:?}", self.shutdown_timeout);
                Err(SyncError::Timeout("Graceful shutdown timed out".to_string()))
            }
        }
    }
}
