//! Downstream pointage service configuration

use super::*;
use crate::core::sync::types::DEFAULT_PRIVILEGE;
use serde::{Deserialize, Serialize};

/// Pointage service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownstreamConfig {
    /// Service base URL
    #[serde(default = "default_downstream_url")]
    pub base_url: String,
    #[serde(default = "default_standard_path")]
    pub standard_path: String,
    #[serde(default = "default_terrain_path")]
    pub terrain_path: String,
    /// Whole-request deadline in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Outcome values counted as success, compared case-insensitively
    #[serde(default = "default_success_markers")]
    pub success_markers: Vec<String>,
    /// Privileges sent with terrain batches that carry none
    #[serde(default = "default_privileges")]
    pub default_privileges: Vec<String>,
}

fn default_privileges() -> Vec<String> {
    vec![DEFAULT_PRIVILEGE.to_string()]
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_downstream_url(),
            standard_path: default_standard_path(),
            terrain_path: default_terrain_path(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            success_markers: default_success_markers(),
            default_privileges: default_privileges(),
        }
    }
}
