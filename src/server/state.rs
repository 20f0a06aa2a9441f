//! State shared by the HTTP handlers

use crate::config::Config;
use crate::core::sync::{SyncPipeline, SyncService};
use crate::monitoring::{AlertManager, MetricsSink};
use crate::queue::DispatchQueue;
use crate::storage::BatchRegistry;
use std::sync::Arc;

/// Handles on the pipeline, cloned into every actix worker
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub service: Arc<SyncService>,
    pub registry: Arc<dyn BatchRegistry>,
    pub queue: Arc<dyn DispatchQueue>,
    pub metrics: Arc<dyn MetricsSink>,
    pub alerts: Arc<AlertManager>,
}

impl AppState {
    pub fn new(config: Config, pipeline: &SyncPipeline) -> Self {
        Self {
            config: Arc::new(config),
            service: pipeline.service(),
            registry: pipeline.registry(),
            queue: pipeline.queue(),
            metrics: pipeline.metrics(),
            alerts: pipeline.alerts(),
        }
    }
}
