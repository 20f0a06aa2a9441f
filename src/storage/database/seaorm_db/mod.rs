//! SeaORM-based database implementation
//!
//! Connection management lives in `connection`; the [`BatchRegistry`]
//! implementation lives in `batch_ops`.
//!
//! [`BatchRegistry`]: crate::storage::BatchRegistry

mod batch_ops;
mod connection;

use sea_orm::DatabaseConnection;

/// SeaORM-based database implementation
#[derive(Debug, Clone)]
pub struct SeaOrmDatabase {
    pub(super) db: DatabaseConnection,
}
