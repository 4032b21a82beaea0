//! Common test utilities for integration tests.
//!
//! All integration tests run against a wiremock server standing in for the
//! clustering service, with the client's poll interval, wait timeout, and
//! retry delay shrunk so full wait/retry cycles finish in milliseconds.

use std::time::Duration;

#[allow(unused_imports)]
pub use corral_client::{Attempt, ClientError, ClusteringClient, RetryPolicy};
#[allow(unused_imports)]
pub use serde_json::json;
#[allow(unused_imports)]
pub use wiremock::{Mock, MockServer, ResponseTemplate};

/// Poll interval used by test clients.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default wait budget used by test clients.
pub const WAIT_TIMEOUT: Duration = Duration::from_millis(100);

/// Build a client against a mock server with fast wait/retry settings.
pub fn test_client(base_url: &str) -> ClusteringClient {
    ClusteringClient::builder()
        .base_url(base_url.to_string())
        .poll_interval(POLL_INTERVAL)
        .wait_timeout(WAIT_TIMEOUT)
        .retry_policy(RetryPolicy {
            attempts: 5,
            delay: Duration::from_millis(5),
        })
        .build()
        .expect("test client")
}

/// An action representation wrapped the way the service wraps it.
#[allow(dead_code)]
pub fn action_body(id: &str, status: &str) -> serde_json::Value {
    json!({"action": {"id": id, "status": status, "status_reason": format!("{status} reason")}})
}

/// A 404 error payload.
#[allow(dead_code)]
pub fn not_found_body(what: &str) -> serde_json::Value {
    json!({"error": {"code": 404, "message": format!("The {what} could not be found.")}})
}
