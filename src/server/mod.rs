//! HTTP adapter over the sync service
//!
//! Handlers are thin: they extract the caller identity from headers, call
//! [`SyncService`](crate::core::sync::SyncService) and wrap the answer in
//! an [`ApiResponse`](routes::ApiResponse). Errors render through
//! `SyncError`'s `ResponseError` impl.

pub mod routes;
pub mod server;
pub mod state;


pub use server::HttpServer;
pub use state::AppState;
