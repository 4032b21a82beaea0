//! Error types for the clustering API client.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while driving the clustering service under test.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level HTTP error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The polled or targeted resource does not exist (HTTP 404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A mutating call was rejected because an in-flight action still holds
    /// the resource lock (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The service rejected the request body or parameters (HTTP 400).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Any other error response from the service.
    #[error("API error ({status}) at {url}: {message}")]
    Api {
        status: u16,
        url: String,
        message: String,
    },

    /// Response body did not have the expected shape.
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// Invalid base or webhook URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A status wait exhausted its budget.
    #[error(
        "timed out after {timeout:?} waiting for {resource_type} '{resource_id}' to reach one of [{}]",
        .statuses.join(", ")
    )]
    WaitTimeout {
        resource_type: String,
        resource_id: String,
        statuses: Vec<String>,
        timeout: Duration,
    },

    /// A deletion wait exhausted its budget while the resource kept resolving.
    #[error("timed out after {timeout:?} waiting for {resource_type} '{resource_id}' to be deleted")]
    DeleteTimeout {
        resource_type: String,
        resource_id: String,
        timeout: Duration,
    },

    /// The conflict-retry loop ran out of attempts without any outcome.
    #[error("retry budget exhausted after {0} attempts")]
    RetryExhausted(u32),
}

impl ClientError {
    /// True for HTTP 404, the success signal of a deletion wait.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True for HTTP 409, the only error the conflict retrier absorbs.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// True when a wait exhausted its budget.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::WaitTimeout { .. } | Self::DeleteTimeout { .. })
    }
}
