//! # pointage-sync
//!
//! Offline batch synchronization of time-clock events ("pointages").
//!
//! Mobile clients upload batches of badge or GPS pointages recorded while
//! offline. Each batch is validated, stored, queued, and forwarded to the
//! pointage service by a pool of workers, with exponential-backoff retries,
//! a dead-letter channel and a recovery sweep for lost messages.
//!
//! ## Embedding the pipeline
//!
//! ```rust,no_run
//! use pointage_sync::{Config, SyncPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/offline-sync.yaml").await?;
//!     let pipeline = SyncPipeline::from_config(&config).await?;
//!     let workers = pipeline.start_workers();
//!
//!     pointage_sync::server::HttpServer::new(&config, &pipeline)
//!         .start()
//!         .await?;
//!
//!     workers.shutdown().await;
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod monitoring;
pub mod queue;
pub mod server;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use core::sync::{SyncPipeline, SyncService};
pub use utils::error::{Result, SyncError};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
