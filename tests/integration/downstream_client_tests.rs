//! HTTP client tests against a wiremock pointage service

use crate::assert_err;
use crate::common::BatchFactory;
use pointage_sync::config::DownstreamConfig;
use pointage_sync::core::downstream::{
    DownstreamError, HttpPointageClient, PointageClient, StandardPointageRequest,
};
use pointage_sync::core::sync::PointageRecords;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STANDARD_PATH: &str = "/api/v1/pointages/offline/batch";
const TERRAIN_PATH: &str = "/api/v1/pointages/offline/terrain/batch";

fn client_for(server: &MockServer) -> HttpPointageClient {
    let config = DownstreamConfig {
        base_url: format!("{}/", server.uri()),
        timeout_secs: 1,
        connect_timeout_secs: 1,
        ..DownstreamConfig::default()
    };
    HttpPointageClient::new(&config).expect("client should build")
}

fn standard_records() -> Vec<pointage_sync::core::sync::StandardPointage> {
    match BatchFactory::standard_records(2) {
        PointageRecords::Standard(records) => records,
        PointageRecords::Terrain(_) => unreachable!(),
    }
}

fn terrain_records() -> Vec<pointage_sync::core::sync::TerrainPointage> {
    match BatchFactory::terrain_records(1) {
        PointageRecords::Terrain(records) => records,
        PointageRecords::Standard(_) => unreachable!(),
    }
}

// ==================== Request Shape Tests ====================

#[tokio::test]
async fn test_standard_request_shape_and_results() {
    let server = MockServer::start().await;
    let records = standard_records();

    Mock::given(method("POST"))
        .and(path(STANDARD_PATH))
        .and(query_param("email", "agent@example.com"))
        .and(body_json(StandardPointageRequest::from(records.as_slice())))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"agent": "1000", "date": "2024-03-01", "statut": "SUCCESS"},
            {"agent": 1001, "statut": "ERREUR", "message": "doublon"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let results = client_for(&server)
        .submit_standard("agent@example.com", &records)
        .await
        .expect("call should succeed");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].outcome, "SUCCESS");
    assert_eq!(results[1].subject.as_deref(), Some("1001"));
    assert_eq!(results[1].message.as_deref(), Some("doublon"));
}

#[tokio::test]
async fn test_terrain_request_carries_privileges() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TERRAIN_PATH))
        .and(query_param("email", "agent@example.com"))
        .and(header_exists("X-User-Privileges"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"statut": "SUCCES", "isTerrain": true}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let privileges = vec!["AUTH_CHEF".to_string(), "AUTH_COLLABORATEUR".to_string()];
    let results = client_for(&server)
        .submit_terrain("agent@example.com", &terrain_records(), &privileges)
        .await
        .expect("call should succeed");

    assert_eq!(results.len(), 1);
    assert!(results[0].is_terrain);

    let requests = server.received_requests().await.expect("recording is on");
    let sent = requests[0]
        .headers
        .get("X-User-Privileges")
        .and_then(|v| v.to_str().ok());
    assert_eq!(sent, Some("AUTH_CHEF,AUTH_COLLABORATEUR"));
}

// ==================== Response Handling Tests ====================

#[tokio::test]
async fn test_bad_request_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("matricule inconnu"))
        .mount(&server)
        .await;

    let err = assert_err!(
        client_for(&server)
            .submit_standard("agent@example.com", &standard_records())
            .await
    );

    assert!(matches!(err, DownstreamError::Rejected { status: 400, ref detail } if detail == "matricule inconnu"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = assert_err!(
        client_for(&server)
            .submit_standard("agent@example.com", &standard_records())
            .await
    );

    assert!(matches!(err, DownstreamError::Server { status: 503, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_empty_body_means_no_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let results = client_for(&server)
        .submit_standard("agent@example.com", &standard_records())
        .await
        .expect("call should succeed");
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = assert_err!(
        client_for(&server)
            .submit_standard("agent@example.com", &standard_records())
            .await
    );
    assert!(matches!(err, DownstreamError::Decode(_)));
}

#[tokio::test]
async fn test_slow_service_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = assert_err!(
        client_for(&server)
            .submit_standard("agent@example.com", &standard_records())
            .await
    );
    assert_eq!(err, DownstreamError::Timeout);
}
