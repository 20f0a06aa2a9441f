//! Redis connectivity for the list-based broker

use crate::config::RedisConfig;
use crate::utils::error::{Result, SyncError};
use redis::{Client, aio::MultiplexedConnection};
use std::time::Duration;
use tracing::info;

/// One multiplexed connection shared by every queue operation
#[derive(Clone)]
pub struct RedisPool {
    connection: MultiplexedConnection,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPool").finish_non_exhaustive()
    }
}

impl RedisPool {
    /// Connect and check the server answers PING
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let target = redact_password(&config.url);
        let client = Client::open(config.url.as_str()).map_err(SyncError::Redis)?;

        let mut connection = tokio::time::timeout(
            Duration::from_secs(config.connection_timeout),
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| SyncError::Timeout(format!("connecting to Redis at {}", target)))?
        .map_err(SyncError::Redis)?;

        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(SyncError::Redis)?;

        info!(url = %target, "Connected to Redis");
        Ok(Self { connection })
    }

    /// Handles are cheap clones of the multiplexed connection
    pub fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

/// URL safe for logs
fn redact_password(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        }
        Err(_) => "<unparsable redis url>".to_string(),
    }
}
