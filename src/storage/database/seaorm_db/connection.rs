use crate::config::DatabaseConfig;
use crate::utils::error::{Result, SyncError};
use sea_orm::{ConnectOptions, ConnectionTrait, Database};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{error, info};

use super::super::migration::Migrator;
use super::SeaOrmDatabase;

/// Pooled connections are recycled after this long
const CONNECTION_LIFETIME: Duration = Duration::from_secs(3600);

impl SeaOrmDatabase {
    /// Open the connection pool for the batch registry
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let mut opt = ConnectOptions::new(config.url.clone());
        opt.max_connections(config.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.connection_timeout))
            .acquire_timeout(Duration::from_secs(config.connection_timeout.max(1) * 6))
            .max_lifetime(CONNECTION_LIFETIME)
            .sqlx_logging(true)
            .sqlx_logging_level(log::LevelFilter::Debug);

        let db = Database::connect(opt).await.map_err(SyncError::Database)?;

        info!(
            backend = ?db.get_database_backend(),
            max_connections = config.max_connections,
            "Batch registry connected"
        );
        Ok(Self { db })
    }

    /// Create or upgrade the `sync_batches` table
    pub async fn migrate(&self) -> Result<()> {
        Migrator::up(&self.db, None).await.map_err(|e| {
            error!("Registry migration failed: {}", e);
            SyncError::Database(e)
        })?;
        info!("Registry schema is up to date");
        Ok(())
    }

    pub async fn close(self) -> Result<()> {
        self.db.close().await.map_err(SyncError::Database)
    }
}
