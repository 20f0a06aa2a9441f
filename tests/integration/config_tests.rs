//! Configuration loading tests

use crate::{assert_err, assert_ok};
use pointage_sync::Config;
use pointage_sync::config::BrokerBackend;
use pointage_sync::utils::error::SyncError;
use std::collections::HashMap;
use std::io::Write;

const SAMPLE: &str = r#"
server:
  port: 9090
broker:
  backend: memory
  queue_prefix: test.pointage
  message_ttl_secs: 120
downstream:
  base_url: http://pointage.internal:8081
  success_markers: [SUCCESS, SUCCES, OK]
sync:
  max_retries: 5
  retention_days: 15
  workers: 4
housekeeping:
  purge_after_days: 90
"#;

#[tokio::test]
async fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(SAMPLE.as_bytes()).expect("write config");

    let config = assert_ok!(Config::from_file(file.path()).await);

    assert_eq!(config.broker().queue_prefix, "test.pointage");
    assert_eq!(config.broker().queue_key(), "test.pointage.queue");
    assert_eq!(config.broker().message_ttl_secs, 120);
    assert_eq!(config.sync().retention_days, 15);
    assert_eq!(config.downstream().success_markers.len(), 3);
    assert_eq!(config.housekeeping().purge_after_days, Some(90));
}

#[tokio::test]
async fn test_missing_file_is_config_error() {
    let err = assert_err!(Config::from_file("/nonexistent/offline-sync.yaml").await);
    assert!(matches!(err, SyncError::Config(_)));
}

#[test]
fn test_defaults_apply_to_missing_sections() {
    let config = assert_ok!(Config::from_yaml("server:\n  port: 9000\n"));

    assert_eq!(config.server().port, 9000);
    assert_eq!(config.broker().backend, BrokerBackend::Memory);
    assert_eq!(config.sync().max_retries, 3);
    assert_eq!(config.sync().max_batch_size, 1000);
    assert_eq!(config.sync().retention_days, 30);
    assert!(config.housekeeping().purge_after_days.is_none());
    assert_ok!(config.validate());
}

#[test]
fn test_overrides_take_precedence() {
    let mut config = assert_ok!(Config::from_yaml(SAMPLE));
    let env: HashMap<&str, &str> = HashMap::from([
        ("SYNC_SERVER_PORT", "7000"),
        ("SYNC_BROKER_BACKEND", "REDIS"),
        ("SYNC_MAX_RETRIES", "not-a-number"),
        ("POINTAGE_SERVICE_URL", "http://other:8081"),
    ]);

    config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

    assert_eq!(config.server().port, 7000);
    assert_eq!(config.broker().backend, BrokerBackend::Redis);
    assert_eq!(config.sync().max_retries, 5);
    assert_eq!(config.downstream().base_url, "http://other:8081");
}

#[test]
fn test_invalid_worker_count_rejected() {
    let config = assert_ok!(Config::from_yaml("sync:\n  workers: 0\n"));
    let err = assert_err!(config.validate());
    assert!(err.to_string().contains("workers"));
}

#[test]
fn test_malformed_yaml_rejected() {
    let err = assert_err!(Config::from_yaml("sync: [unclosed"));
    assert!(matches!(err, SyncError::Config(_)));
}
