//! Status and deletion wait behavior.
//!
//! # Invariants
//! - A wait sleeps one poll interval before each fetch; a budget no larger
//!   than one interval still gets exactly one poll.
//! - The matched representation is returned as fetched, without re-reading.
//! - Deletion waits fetch before sleeping and succeed on the first 404.
//! - Fetch errors other than 404 (for deletion waits) propagate unmodified.

mod common;

use common::*;
use std::time::Duration;
use wiremock::matchers::{method, path};

#[tokio::test]
async fn test_wait_for_status_returns_on_match() {
    let mock_server = MockServer::start().await;

    // Two polls see a running action, the third sees the terminal status.
    Mock::given(method("GET"))
        .and(path("/v1/actions/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(action_body("a1", "RUNNING")))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/actions/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(action_body("a1", "SUCCEEDED")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let res = client
        .wait_for_status("actions", "a1", "SUCCEEDED", Some(Duration::from_secs(1)))
        .await
        .unwrap();

    assert_eq!(res.status_field().unwrap(), "SUCCEEDED");
    assert_eq!(res.status_reason(), Some("SUCCEEDED reason"));
}

#[tokio::test]
async fn test_wait_for_status_accepts_any_of_a_set() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/actions/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(action_body("a1", "FAILED")))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let res = client
        .wait_for_status("actions", "a1", ["SUCCEEDED", "FAILED"], None)
        .await
        .unwrap();

    assert_eq!(res.status_field().unwrap(), "FAILED");
}

#[tokio::test]
async fn test_wait_for_status_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/clusters/c1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"cluster": {"id": "c1", "status": "CREATING"}})),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let err = client
        .wait_for_status("clusters", "c1", "ACTIVE", Some(Duration::from_millis(50)))
        .await
        .unwrap_err();

    match err {
        ClientError::WaitTimeout {
            resource_type,
            resource_id,
            statuses,
            timeout,
        } => {
            assert_eq!(resource_type, "clusters");
            assert_eq!(resource_id, "c1");
            assert_eq!(statuses, vec!["ACTIVE".to_string()]);
            assert_eq!(timeout, Duration::from_millis(50));
        }
        other => panic!("expected WaitTimeout, got {other:?}"),
    }

    let polls = mock_server.received_requests().await.unwrap().len();
    assert!(polls >= 1, "expected at least one poll, saw {polls}");
}

#[tokio::test]
async fn test_budget_shorter_than_interval_still_polls_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/actions/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(action_body("a1", "RUNNING")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ClusteringClient::builder()
        .base_url(mock_server.uri())
        .poll_interval(Duration::from_millis(30))
        .build()
        .unwrap();

    let err = client
        .wait_for_status("actions", "a1", "SUCCEEDED", Some(Duration::from_millis(10)))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_rewait_on_terminal_resource_matches_first_poll() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/actions/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(action_body("a1", "SUCCEEDED")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let res = client
        .wait_for_status("actions", "a1", "SUCCEEDED", None)
        .await
        .unwrap();
    assert_eq!(res.status_field().unwrap(), "SUCCEEDED");
}

#[tokio::test]
async fn test_wait_for_status_propagates_fetch_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/actions/a1"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": {"code": 400, "message": "bad action id"}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let err = client
        .wait_for_status("actions", "a1", "SUCCEEDED", None)
        .await
        .unwrap_err();

    match err {
        ClientError::BadRequest(message) => assert_eq!(message, "bad action id"),
        other => panic!("expected BadRequest, got {other:?}"),
    }
}

#[tokio::test]
async fn test_wait_for_status_rejects_statusless_representation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/actions/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"action": {"id": "a1"}})))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let err = client
        .wait_for_status("actions", "a1", "SUCCEEDED", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_wait_for_delete_succeeds_once_resource_is_gone() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/clusters/c1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"cluster": {"id": "c1", "status": "DELETING"}})),
        )
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/clusters/c1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found_body("cluster")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    client
        .wait_for_delete("clusters", "c1", Some(Duration::from_secs(1)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_wait_for_delete_returns_immediately_when_already_gone() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/clusters/c1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found_body("cluster")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    // The first fetch happens before any sleep, so even a zero budget works.
    client
        .wait_for_delete("clusters", "c1", Some(Duration::ZERO))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_wait_for_delete_times_out_while_resource_persists() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/clusters/c1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"cluster": {"id": "c1", "status": "ACTIVE"}})),
        )
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let err = client
        .wait_for_delete("clusters", "c1", Some(Duration::from_millis(40)))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::DeleteTimeout { .. }));
}

#[tokio::test]
async fn test_wait_for_delete_propagates_other_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/clusters/c1"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"error": {"code": 500, "message": "boom"}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server.uri());
    let err = client.wait_for_delete("clusters", "c1", None).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 500, .. }));
}
