//! Pointage service client trait and reqwest implementation

use super::error::DownstreamError;
use super::types::{StandardPointageRequest, TerrainPointageRequest};
use crate::config::DownstreamConfig;
use crate::core::sync::types::{PointageResult, StandardPointage, TerrainPointage};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Response};
use std::time::Duration;
use tracing::{debug, warn};

/// Operations offered by the downstream pointage service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PointageClient: Send + Sync {
    /// Book badge pointages for `email`
    async fn submit_standard(
        &self,
        email: &str,
        records: &[StandardPointage],
    ) -> std::result::Result<Vec<PointageResult>, DownstreamError>;

    /// Book GPS pointages for `email` under `privileges`
    async fn submit_terrain(
        &self,
        email: &str,
        records: &[TerrainPointage],
        privileges: &[String],
    ) -> std::result::Result<Vec<PointageResult>, DownstreamError>;
}

/// reqwest-backed client
#[derive(Debug, Clone)]
pub struct HttpPointageClient {
    client: Client,
    standard_url: String,
    terrain_url: String,
}

impl HttpPointageClient {
    /// Build a client with the configured request timeout
    pub fn new(config: &DownstreamConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .user_agent(concat!("pointage-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SyncError::HttpClient)?;

        let base = config.base_url.trim_end_matches('/');
        Ok(Self {
            client,
            standard_url: format!("{}{}", base, config.standard_path),
            terrain_url: format!("{}{}", base, config.terrain_path),
        })
    }

    async fn decode(response: Response) -> std::result::Result<Vec<PointageResult>, DownstreamError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!(status = status.as_u16(), "Pointage service returned an error");
            return Err(DownstreamError::from_status(status.as_u16(), body));
        }

        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| DownstreamError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PointageClient for HttpPointageClient {
    async fn submit_standard(
        &self,
        email: &str,
        records: &[StandardPointage],
    ) -> std::result::Result<Vec<PointageResult>, DownstreamError> {
        debug!(count = records.len(), "Sending standard pointages");

        let response = self
            .client
            .post(&self.standard_url)
            .query(&[("email", email)])
            .json(&StandardPointageRequest::from(records))
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn submit_terrain(
        &self,
        email: &str,
        records: &[TerrainPointage],
        privileges: &[String],
    ) -> std::result::Result<Vec<PointageResult>, DownstreamError> {
        debug!(count = records.len(), "Sending terrain pointages");

        let response = self
            .client
            .post(&self.terrain_url)
            .query(&[("email", email)])
            .header("X-User-Privileges", privileges.join(","))
            .json(&TerrainPointageRequest::from(records))
            .send()
            .await?;

        Self::decode(response).await
    }
}
