//! Client for the downstream pointage service
//!
//! The pipeline only talks to [`PointageClient`]; [`HttpPointageClient`] is
//! the reqwest adapter for the real service.

mod client;
mod error;
mod types;

pub use client::{HttpPointageClient, PointageClient};
pub use error::DownstreamError;
pub use types::{StandardPointageRequest, TerrainPointageRequest, WireStandardPointage, WireTerrainPointage};

#[cfg(test)]
pub use client::MockPointageClient;
