//! End-to-end pipeline tests: service, queue, workers and registry together

use crate::assert_ok;
use crate::common::{BatchFactory, ScriptedClient, TestDatabase, fixtures::result};
use chrono::Utc;
use pointage_sync::Config;
use pointage_sync::config::AlertingConfig;
use pointage_sync::core::downstream::{DownstreamError, PointageClient};
use pointage_sync::core::sync::{
    DispatchMessage, ExecutionOutcome, SkipReason, SubmitBatch, SyncPipeline, SyncStatus,
    SyncStatusView,
};
use pointage_sync::monitoring::{AlertManager, MetricsSink, SyncMetrics};
use pointage_sync::queue::{DispatchQueue, InMemoryQueue};
use pointage_sync::storage::BatchRegistry;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    pipeline: SyncPipeline,
    client: Arc<ScriptedClient>,
    _db: TestDatabase,
}

async fn harness(client: ScriptedClient) -> Harness {
    let mut config = Config::default();
    config.service.sync.base_delay_ms = 1;
    config.service.sync.workers = 2;

    let db = TestDatabase::new().await;
    let registry: Arc<dyn BatchRegistry> = db.db_arc();
    let queue: Arc<dyn DispatchQueue> = Arc::new(InMemoryQueue::new(Duration::from_secs(60)));
    let client = Arc::new(client);
    let downstream: Arc<dyn PointageClient> = client.clone();
    let alerts = Arc::new(AlertManager::new(&AlertingConfig::default()));
    let metrics: Arc<dyn MetricsSink> = Arc::new(SyncMetrics::new());

    Harness {
        pipeline: SyncPipeline::new(&config, registry, queue, downstream, alerts, metrics),
        client,
        _db: db,
    }
}

fn submission(count: usize) -> SubmitBatch {
    SubmitBatch {
        email: "agent@example.com".to_string(),
        records: BatchFactory::standard_records(count),
        privileges: vec![],
    }
}

/// Poll until the batch is terminal
async fn wait_for_terminal(pipeline: &SyncPipeline, batch_id: &str) -> SyncStatusView {
    let service = pipeline.service();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);

    loop {
        let view = assert_ok!(service.status(batch_id).await);
        if view.status.is_terminal() {
            return view;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "batch {} stuck in {}",
            batch_id,
            view.status
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

async fn wait_for_alerts(alerts: &AlertManager, expected: u64) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while alerts.stats().raised < expected {
        assert!(tokio::time::Instant::now() < deadline, "alert never sent");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// ==================== Happy Path Tests ====================

#[tokio::test]
async fn test_partial_failure_end_to_end() {
    let h = harness(ScriptedClient::always(Ok(vec![
        result("SUCCESS"),
        result("SUCCESS"),
        result("FAILURE"),
    ])))
    .await;
    let workers = h.pipeline.start_workers();

    let response = assert_ok!(h.pipeline.service().submit(submission(3)).await);
    assert_eq!(response.status, SyncStatus::Pending);
    assert!(response.sent_to_queue);

    let view = wait_for_terminal(&h.pipeline, &response.batch_id).await;
    assert_eq!(view.status, SyncStatus::PartialFailure);
    assert_eq!(view.success_count, 2);
    assert_eq!(view.failure_count, 1);
    assert_eq!(view.results.len(), 3);
    assert_eq!(h.client.calls(), 1);

    let failures = assert_ok!(h.pipeline.service().failures("agent@example.com").await);
    assert_eq!(failures.len(), 1);

    workers.shutdown().await;
}

#[tokio::test]
async fn test_transient_error_then_success() {
    let h = harness(ScriptedClient::scripted(
        vec![Err(DownstreamError::from_status(503, "busy"))],
        Ok(vec![result("SUCCES")]),
    ))
    .await;
    let workers = h.pipeline.start_workers();

    let response = assert_ok!(h.pipeline.service().submit(submission(1)).await);
    let view = wait_for_terminal(&h.pipeline, &response.batch_id).await;

    assert_eq!(view.status, SyncStatus::Completed);
    assert_eq!(view.retry_count, 1);
    assert_eq!(h.client.calls(), 2);
    assert_eq!(h.pipeline.metrics().snapshot().retries, 1);

    workers.shutdown().await;
}

// ==================== Failure Path Tests ====================

#[tokio::test]
async fn test_exhausted_retries_fail_and_alert_once() {
    let h = harness(ScriptedClient::always(Err(DownstreamError::Timeout))).await;
    let workers = h.pipeline.start_workers();

    let response = assert_ok!(h.pipeline.service().submit(submission(2)).await);
    let view = wait_for_terminal(&h.pipeline, &response.batch_id).await;

    assert_eq!(view.status, SyncStatus::Failed);
    assert_eq!(view.retry_count, 3);
    assert!(
        view.error_message
            .as_deref()
            .is_some_and(|m| m.contains("max retries"))
    );
    assert_eq!(h.client.calls(), 4);

    let alerts = h.pipeline.alerts();
    wait_for_alerts(&alerts, 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(alerts.stats().raised, 1);
    assert_eq!(h.pipeline.metrics().snapshot().dead_lettered, 1);

    workers.shutdown().await;
}

#[tokio::test]
async fn test_rejected_payload_fails_without_retry() {
    let h = harness(ScriptedClient::always(Err(DownstreamError::from_status(
        400,
        "badge inconnu",
    ))))
    .await;
    let workers = h.pipeline.start_workers();

    let response = assert_ok!(h.pipeline.service().submit(submission(1)).await);
    let view = wait_for_terminal(&h.pipeline, &response.batch_id).await;

    assert_eq!(view.status, SyncStatus::Failed);
    assert_eq!(view.retry_count, 0);
    assert_eq!(h.client.calls(), 1);

    workers.shutdown().await;
}

// ==================== Idempotence Tests ====================

#[tokio::test]
async fn test_redelivered_message_for_completed_batch_is_noop() {
    let h = harness(ScriptedClient::always(Ok(vec![result("SUCCESS")]))).await;
    let workers = h.pipeline.start_workers();

    let response = assert_ok!(h.pipeline.service().submit(submission(1)).await);
    let view = wait_for_terminal(&h.pipeline, &response.batch_id).await;
    assert_eq!(view.status, SyncStatus::Completed);
    workers.shutdown().await;

    let batch = assert_ok!(h.pipeline.registry().find_by_id(&response.batch_id).await)
        .expect("batch should exist");
    let outcome = assert_ok!(
        h.pipeline
            .executor()
            .execute(&DispatchMessage::for_batch(&batch, 0, Utc::now()))
            .await
    );

    assert_eq!(
        outcome,
        ExecutionOutcome::Duplicate(SkipReason::Terminal(SyncStatus::Completed))
    );
    assert_eq!(h.client.calls(), 1);

    let after = assert_ok!(h.pipeline.service().status(&response.batch_id).await);
    assert_eq!(after.updated_at, view.updated_at);
}

#[tokio::test]
async fn test_user_retry_resubmits_failed_records() {
    let h = harness(ScriptedClient::scripted(
        vec![Ok(vec![result("SUCCESS"), result("FAILURE")])],
        Ok(vec![result("SUCCESS")]),
    ))
    .await;
    let workers = h.pipeline.start_workers();

    let first = assert_ok!(h.pipeline.service().submit(submission(2)).await);
    let view = wait_for_terminal(&h.pipeline, &first.batch_id).await;
    assert_eq!(view.status, SyncStatus::PartialFailure);

    let retried = assert_ok!(h.pipeline.service().retry(&first.batch_id).await);
    assert_ne!(retried.batch_id, first.batch_id);
    assert_eq!(retried.total_count, 1);

    let second = wait_for_terminal(&h.pipeline, &retried.batch_id).await;
    assert_eq!(second.status, SyncStatus::Completed);
    assert_eq!(second.retried_from.as_deref(), Some(first.batch_id.as_str()));

    workers.shutdown().await;
}
