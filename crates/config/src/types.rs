//! Configuration types for the corral test client.

use std::time::Duration;

use secrecy::SecretString;

/// Default per-request timeout.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default budget for a single status or deletion wait.
pub(crate) const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(180);

/// Connection settings for the clustering service under test.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the clustering API (e.g. http://127.0.0.1:8778).
    pub base_url: String,
    /// Bearer token for authenticated requests, if the deployment needs one.
    pub auth_token: Option<SecretString>,
    /// Whether to skip TLS certificate verification.
    pub skip_verify: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Default budget for waiting on a resource status or deletion.
    pub wait_timeout: Duration,
    /// API microversion requested on every call.
    pub api_microversion: String,
}

impl Config {
    /// Settings for a local deployment with no auth.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            skip_verify: false,
            timeout: DEFAULT_TIMEOUT,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            api_microversion: "latest".to_string(),
        }
    }
}
