//! SeaORM registry tests against in-memory SQLite

use crate::common::{BatchFactory, TestDatabase, fixtures::result};
use crate::{assert_err, assert_ok};
use chrono::{Duration, Utc};
use futures::future::join_all;
use pointage_sync::core::sync::{BatchTransition, SkipReason, SyncStatus, TransitionOutcome};
use pointage_sync::storage::BatchRegistry;
use pointage_sync::utils::error::SyncError;

// ==================== Create / Find Tests ====================

#[tokio::test]
async fn test_create_and_find_roundtrip() {
    let db = TestDatabase::new().await;
    let mut batch = BatchFactory::standard("b-1", 3);
    batch.privileges = vec!["AUTH_CHEF".to_string()];

    assert_ok!(db.db().create(&batch).await);

    let stored = assert_ok!(db.db().find_by_id("b-1").await).expect("batch should exist");
    assert_eq!(stored.batch_id, "b-1");
    assert_eq!(stored.status, SyncStatus::Pending);
    assert_eq!(stored.total_count, 3);
    assert_eq!(stored.records, batch.records);
    assert_eq!(stored.privileges, vec!["AUTH_CHEF".to_string()]);
    assert_eq!(stored.version, 0);
}

#[tokio::test]
async fn test_duplicate_batch_id_rejected() {
    let db = TestDatabase::new().await;
    let batch = BatchFactory::standard("dup", 1);

    assert_ok!(db.db().create(&batch).await);
    let err = assert_err!(db.db().create(&batch).await);
    assert!(matches!(err, SyncError::DuplicateBatchId(id) if id == "dup"));
}

#[tokio::test]
async fn test_find_unknown_batch() {
    let db = TestDatabase::new().await;
    assert!(assert_ok!(db.db().find_by_id("missing").await).is_none());
}

// ==================== Transition Tests ====================

#[tokio::test]
async fn test_transitions_persist_results() {
    let db = TestDatabase::new().await;
    assert_ok!(db.db().create(&BatchFactory::standard("b-2", 3)).await);

    let started = assert_ok!(db.db().apply_transition("b-2", &BatchTransition::Start).await);
    assert!(started.is_applied());
    assert_eq!(started.batch().status, SyncStatus::InProgress);

    let completed = assert_ok!(
        db.db()
            .apply_transition(
                "b-2",
                &BatchTransition::Complete {
                    results: vec![result("SUCCESS"), result("SUCCESS"), result("FAILURE")],
                    success_count: 2,
                    failure_count: 1,
                    note: None,
                },
            )
            .await
    );
    assert!(completed.is_applied());

    let stored = assert_ok!(db.db().find_by_id("b-2").await).expect("batch should exist");
    assert_eq!(stored.status, SyncStatus::PartialFailure);
    assert_eq!(stored.success_count, 2);
    assert_eq!(stored.failure_count, 1);
    assert_eq!(stored.results.len(), 3);
    assert_eq!(stored.version, 2);
    assert!(stored.completed_at.is_some());
}

#[tokio::test]
async fn test_terminal_batch_is_not_rewritten() {
    let db = TestDatabase::new().await;
    assert_ok!(db.db().create(&BatchFactory::standard("b-3", 1)).await);
    assert_ok!(
        db.db()
            .apply_transition(
                "b-3",
                &BatchTransition::Fail {
                    error: "first".to_string()
                }
            )
            .await
    );

    let outcome = assert_ok!(
        db.db()
            .apply_transition(
                "b-3",
                &BatchTransition::Fail {
                    error: "second".to_string()
                }
            )
            .await
    );

    match outcome {
        TransitionOutcome::Skipped { batch, reason } => {
            assert_eq!(reason, SkipReason::Terminal(SyncStatus::Failed));
            assert_eq!(batch.error_message.as_deref(), Some("first"));
        }
        TransitionOutcome::Applied(_) => panic!("terminal batch was modified"),
    }
}

#[tokio::test]
async fn test_transition_on_unknown_batch() {
    let db = TestDatabase::new().await;
    let err = assert_err!(db.db().apply_transition("nope", &BatchTransition::Start).await);
    assert!(matches!(err, SyncError::BatchNotFound(_)));
}

#[tokio::test]
async fn test_concurrent_start_claims_once() {
    let db = TestDatabase::new().await;
    assert_ok!(db.db().create(&BatchFactory::standard("race", 1)).await);

    let attempts = (0..5).map(|_| db.db().apply_transition("race", &BatchTransition::Start));
    let outcomes = join_all(attempts).await;

    let applied = outcomes
        .into_iter()
        .map(|o| assert_ok!(o))
        .filter(TransitionOutcome::is_applied)
        .count();
    assert_eq!(applied, 1);
}

// ==================== Query Tests ====================

#[tokio::test]
async fn test_find_by_email_and_status_newest_first() {
    let db = TestDatabase::new().await;
    let registry = db.db();

    assert_ok!(registry.create(&BatchFactory::for_email("old", "a@x.sn", 30)).await);
    assert_ok!(registry.create(&BatchFactory::for_email("new", "a@x.sn", 5)).await);
    assert_ok!(registry.create(&BatchFactory::for_email("other", "b@x.sn", 1)).await);
    for id in ["old", "new", "other"] {
        assert_ok!(
            registry
                .apply_transition(
                    id,
                    &BatchTransition::Fail {
                        error: "boom".to_string()
                    }
                )
                .await
        );
    }

    let failed = assert_ok!(
        registry
            .find_by_email_and_status("a@x.sn", &[SyncStatus::Failed, SyncStatus::PartialFailure])
            .await
    );
    let ids: Vec<_> = failed.iter().map(|b| b.batch_id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old"]);

    let pending = assert_ok!(
        registry
            .find_by_email_and_status("a@x.sn", &[SyncStatus::Pending])
            .await
    );
    assert!(pending.is_empty());
}

#[tokio::test]
async fn test_find_stalled_oldest_first() {
    let db = TestDatabase::new().await;
    let registry = db.db();

    assert_ok!(registry.create(&BatchFactory::standard_aged("s-1", 1, 90)).await);
    assert_ok!(registry.create(&BatchFactory::standard_aged("s-2", 1, 120)).await);
    assert_ok!(registry.create(&BatchFactory::standard_aged("fresh", 1, 1)).await);

    let stalled = assert_ok!(
        registry
            .find_stalled(
                &[SyncStatus::Pending, SyncStatus::Retry],
                Utc::now() - Duration::minutes(30),
                10,
            )
            .await
    );
    let ids: Vec<_> = stalled.iter().map(|b| b.batch_id.as_str()).collect();
    assert_eq!(ids, vec!["s-2", "s-1"]);

    let limited = assert_ok!(
        registry
            .find_stalled(&[SyncStatus::Pending], Utc::now(), 1)
            .await
    );
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn test_purge_only_removes_old_terminal_batches() {
    let db = TestDatabase::new().await;
    let registry = db.db();

    assert_ok!(registry.create(&BatchFactory::standard_aged("old-done", 1, 60 * 24 * 10)).await);
    assert_ok!(registry.create(&BatchFactory::standard_aged("old-pending", 1, 60 * 24 * 10)).await);
    assert_ok!(registry.create(&BatchFactory::standard("new-done", 1)).await);
    for id in ["old-done", "new-done"] {
        assert_ok!(
            registry
                .apply_transition(
                    id,
                    &BatchTransition::Fail {
                        error: "x".to_string()
                    }
                )
                .await
        );
    }

    let removed = assert_ok!(registry.purge_terminal_before(Utc::now() - Duration::days(7)).await);
    assert_eq!(removed, 1);
    assert!(assert_ok!(registry.find_by_id("old-done").await).is_none());
    assert!(assert_ok!(registry.find_by_id("old-pending").await).is_some());
    assert!(assert_ok!(registry.find_by_id("new-done").await).is_some());
}

#[tokio::test]
async fn test_count_by_status_and_health() {
    let db = TestDatabase::new().await;
    let registry = db.db();

    assert_ok!(registry.create(&BatchFactory::standard("c-1", 1)).await);
    assert_ok!(registry.create(&BatchFactory::standard("c-2", 1)).await);
    assert_ok!(registry.apply_transition("c-2", &BatchTransition::Start).await);

    let counts = assert_ok!(registry.count_by_status().await);
    assert_eq!(counts.get(&SyncStatus::Pending), Some(&1));
    assert_eq!(counts.get(&SyncStatus::InProgress), Some(&1));
    assert_eq!(counts.get(&SyncStatus::Completed).copied().unwrap_or(0), 0);

    assert_ok!(registry.health_check().await);
}
