//! SeaORM batch registry
//!
//! The `sync_batches` table holds one row per batch. Records, results and
//! privileges are JSON columns; `version` backs the compare-and-swap used by
//! every status transition.

pub mod entities;
pub mod migration;
pub mod seaorm_db;

pub use seaorm_db::SeaOrmDatabase as Database;
