//! Configuration data models
//!
//! One struct per YAML section, each with serde defaults so that any
//! section or field may be omitted.

pub mod broker;
pub mod downstream;
pub mod monitoring;
pub mod server;
pub mod service;
pub mod storage;
pub mod sync;

pub use broker::*;
pub use downstream::*;
pub use monitoring::*;
pub use server::*;
pub use service::*;
pub use storage::*;
pub use sync::*;

/// Default values for configuration
pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

/// Default server port
pub fn default_port() -> u16 {
    8085
}

/// Default maximum body size in bytes
pub fn default_max_body_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

pub fn default_max_connections() -> u32 {
    10
}

pub fn default_connection_timeout() -> u64 {
    5
}

pub fn default_database_url() -> String {
    "sqlite://offline_sync.db?mode=rwc".to_string()
}

pub fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

pub fn default_queue_prefix() -> String {
    "offline.pointage".to_string()
}

/// Message TTL in seconds (1 hour)
pub fn default_message_ttl() -> u64 {
    3600
}

pub fn default_poll_interval_ms() -> u64 {
    500
}

pub fn default_downstream_url() -> String {
    "http://localhost:8081".to_string()
}

pub fn default_standard_path() -> String {
    "/api/v1/pointages/offline/batch".to_string()
}

pub fn default_terrain_path() -> String {
    "/api/v1/pointages/offline/terrain/batch".to_string()
}

/// Default timeout in seconds
pub fn default_timeout() -> u64 {
    30
}

pub fn default_connect_timeout() -> u64 {
    10
}

pub fn default_success_markers() -> Vec<String> {
    vec!["SUCCESS".to_string(), "SUCCES".to_string()]
}

pub fn default_max_batch_size() -> usize {
    1000
}

pub fn default_retention_days() -> i64 {
    30
}

/// Default maximum retry attempts
pub fn default_max_retries() -> u32 {
    3
}

pub fn default_base_delay_ms() -> u64 {
    2000
}

pub fn default_workers() -> usize {
    3
}

/// Every 10 minutes
pub fn default_sweep_interval() -> u64 {
    600
}

/// Message TTL plus five minutes
pub fn default_stale_after() -> u64 {
    default_message_ttl() + 300
}

pub fn default_in_progress_lease() -> u64 {
    600
}

pub fn default_purge_interval() -> u64 {
    3600
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_true() -> bool {
    true
}
