//! Batch persistence
//!
//! [`BatchRegistry`] is the only shared mutable state of the pipeline. It is
//! backed either by SeaORM (sqlite or postgres) or by an in-process map.

pub mod database;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;
mod registry;

pub use database::Database;
pub use memory::InMemoryRegistry;
pub use registry::{BatchRegistry, MAX_TRANSITION_ATTEMPTS};

use crate::config::DatabaseConfig;
use crate::utils::error::Result;
use std::sync::Arc;
use tracing::info;

/// Open the registry selected by configuration
pub async fn connect_registry(config: &DatabaseConfig) -> Result<Arc<dyn BatchRegistry>> {
    if config.enabled {
        let db = Database::new(config).await?;
        db.migrate().await?;
        Ok(Arc::new(db))
    } else {
        info!("Database disabled, batches are kept in memory");
        Ok(Arc::new(InMemoryRegistry::new()))
    }
}
