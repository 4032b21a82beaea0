//! REST API client for the clustering orchestration service.
//!
//! The service exposes plural resource collections (`profiles`, `clusters`,
//! `nodes`, `policies`, `receivers`, `actions`, `events`) under a versioned
//! prefix. Mutating calls on clusters and nodes answer 202 Accepted with a
//! `Location` header pointing at the asynchronous action that performs the
//! work; completion is observed by polling (see `wait.rs`).

use std::time::Duration;

use reqwest::header::LOCATION;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{ClientError, Result};
use crate::models::ApiResponse;
use crate::retry::RetryPolicy;

/// Versioned URL prefix for all resource collections.
const API_VERSION: &str = "v1";

/// Header carrying the requested API microversion.
const MICROVERSION_HEADER: &str = "x-clustering-api-version";

/// Microversion required by the validation endpoints.
const VALIDATE_MICROVERSION: &str = "1.2";

/// Fixed delay between polls of a waited resource.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default budget for a single wait call.
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(180);

/// Builder for [`ClusteringClient`].
pub struct ClusteringClientBuilder {
    base_url: Option<String>,
    auth_token: Option<SecretString>,
    api_microversion: String,
    skip_verify: bool,
    timeout: Duration,
    wait_timeout: Duration,
    poll_interval: Duration,
    retry_policy: RetryPolicy,
}

impl Default for ClusteringClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            auth_token: None,
            api_microversion: "latest".to_string(),
            skip_verify: false,
            timeout: Duration::from_secs(30),
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl ClusteringClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the builder from loaded configuration.
    pub fn from_config(config: &corral_config::Config) -> Self {
        let mut builder = Self::new()
            .base_url(config.base_url.clone())
            .skip_verify(config.skip_verify)
            .timeout(config.timeout)
            .wait_timeout(config.wait_timeout)
            .api_microversion(config.api_microversion.clone());
        if let Some(token) = &config.auth_token {
            builder = builder.auth_token(token.clone());
        }
        builder
    }

    /// Set the base URL of the clustering service.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the bearer token sent with every request.
    pub fn auth_token(mut self, token: SecretString) -> Self {
        self.auth_token = Some(token);
        self
    }

    /// Set the API microversion requested on every call.
    pub fn api_microversion(mut self, version: impl Into<String>) -> Self {
        self.api_microversion = version.into();
        self
    }

    /// Set whether to skip TLS verification.
    pub fn skip_verify(mut self, skip: bool) -> Self {
        self.skip_verify = skip;
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the default budget for status and deletion waits.
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Set the fixed delay between polls.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the retry policy used by conflict-retried helpers.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Strip trailing slashes so endpoint concatenation never doubles them.
    fn normalize_base_url(url: String) -> String {
        url.trim_end_matches('/').to_string()
    }

    /// Build the client.
    pub fn build(self) -> Result<ClusteringClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::InvalidUrl("base_url is required".to_string()))?;
        let base_url = Self::normalize_base_url(base_url);
        Url::parse(&base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;

        let mut http_builder = reqwest::Client::builder().timeout(self.timeout);
        if self.skip_verify && base_url.starts_with("https://") {
            http_builder = http_builder.danger_accept_invalid_certs(true);
        }
        let http = http_builder.build()?;

        Ok(ClusteringClient {
            http,
            base_url,
            auth_token: self.auth_token,
            api_microversion: self.api_microversion,
            wait_timeout: self.wait_timeout,
            poll_interval: self.poll_interval,
            retry_policy: self.retry_policy,
        })
    }
}

/// Clustering service REST API client.
#[derive(Debug)]
pub struct ClusteringClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<SecretString>,
    api_microversion: String,
    pub(crate) wait_timeout: Duration,
    pub(crate) poll_interval: Duration,
    retry_policy: RetryPolicy,
}

impl ClusteringClient {
    /// Create a new client builder.
    pub fn builder() -> ClusteringClientBuilder {
        ClusteringClientBuilder::new()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retry policy used by conflict-retried helpers.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = format!("{}/{}", self.base_url, API_VERSION);
        for segment in segments {
            url.push('/');
            url.push_str(segment);
        }
        url
    }

    fn apply_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut builder = builder.header(
            MICROVERSION_HEADER,
            format!("clustering {}", self.api_microversion),
        );
        if let Some(token) = &self.auth_token {
            builder = builder.header(
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            );
        }
        builder
    }

    async fn dispatch(&self, builder: reqwest::RequestBuilder) -> Result<ApiResponse> {
        let response = self.apply_headers(builder).send().await?;
        Self::into_api_response(response).await
    }

    async fn into_api_response(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);

        let text = response.text().await?;
        let body = if text.is_empty() || text == "null" {
            None
        } else {
            Some(serde_json::from_str::<Value>(&text).map_err(|e| {
                ClientError::InvalidResponse(format!("body is not valid JSON: {e}"))
            })?)
        };

        if status >= 400 {
            let message = extract_error_message(body.as_ref(), &text);
            debug!(status, %url, %message, "request rejected");
            return Err(match status {
                400 => ClientError::BadRequest(message),
                404 => ClientError::NotFound(message),
                409 => ClientError::Conflict(message),
                _ => ClientError::Api {
                    status,
                    url,
                    message,
                },
            });
        }

        Ok(ApiResponse {
            status,
            location,
            body,
        })
    }

    /// GET a single resource.
    pub async fn get_obj(&self, obj_type: &str, obj_id: &str) -> Result<ApiResponse> {
        self.dispatch(self.http.get(self.url(&[obj_type, obj_id])))
            .await
    }

    /// GET a single resource with query parameters.
    pub async fn get_obj_with(
        &self,
        obj_type: &str,
        obj_id: &str,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse> {
        self.dispatch(self.http.get(self.url(&[obj_type, obj_id])).query(query))
            .await
    }

    /// GET a resource collection.
    pub async fn list_objs(&self, obj_type: &str) -> Result<ApiResponse> {
        self.dispatch(self.http.get(self.url(&[obj_type]))).await
    }

    /// GET a resource collection with query parameters.
    pub async fn list_objs_with(
        &self,
        obj_type: &str,
        query: &[(&str, &str)],
    ) -> Result<ApiResponse> {
        self.dispatch(self.http.get(self.url(&[obj_type])).query(query))
            .await
    }

    /// POST a new resource.
    pub async fn create_obj(&self, obj_type: &str, body: Value) -> Result<ApiResponse> {
        self.dispatch(self.http.post(self.url(&[obj_type])).json(&body))
            .await
    }

    /// PATCH an existing resource.
    pub async fn update_obj(&self, obj_type: &str, obj_id: &str, body: Value) -> Result<ApiResponse> {
        self.dispatch(self.http.patch(self.url(&[obj_type, obj_id])).json(&body))
            .await
    }

    /// DELETE a resource. Answers 202 plus an action handle for resources
    /// that are torn down asynchronously.
    pub async fn delete_obj(&self, obj_type: &str, obj_id: &str) -> Result<ApiResponse> {
        self.dispatch(self.http.delete(self.url(&[obj_type, obj_id])))
            .await
    }

    /// POST a spec to the validation endpoint of a collection.
    pub async fn validate_obj(&self, obj_type: &str, body: Value) -> Result<ApiResponse> {
        // Validation endpoints appeared in a fixed microversion.
        let builder = self
            .http
            .post(self.url(&[obj_type, "validate"]))
            .json(&body)
            .header(
                MICROVERSION_HEADER,
                format!("clustering {VALIDATE_MICROVERSION}"),
            );
        let response = self.apply_headers(builder).send().await?;
        Self::into_api_response(response).await
    }

    /// POST an action request (`scale_out`, `policy_attach`, ...) to a
    /// resource. Answers 202 plus the action handle.
    pub async fn trigger_action(
        &self,
        obj_type: &str,
        obj_id: &str,
        body: Value,
    ) -> Result<ApiResponse> {
        self.dispatch(
            self.http
                .post(self.url(&[obj_type, obj_id, "actions"]))
                .json(&body),
        )
        .await
    }

    /// POST a profile-defined operation to a resource.
    pub async fn trigger_operation(
        &self,
        obj_type: &str,
        obj_id: &str,
        body: Value,
    ) -> Result<ApiResponse> {
        self.dispatch(
            self.http
                .post(self.url(&[obj_type, obj_id, "ops"]))
                .json(&body),
        )
        .await
    }

    /// POST to a receiver's webhook URL. The URL is already fully formed and
    /// carries its own credential, so no auth header is attached.
    pub async fn trigger_webhook(&self, webhook_url: &str, body: Option<Value>) -> Result<ApiResponse> {
        Url::parse(webhook_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        let mut builder = self.http.post(webhook_url);
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        let response = builder.send().await?;
        Self::into_api_response(response).await
    }

    /// List the operations a profile type supports.
    pub async fn list_profile_type_operations(&self, profile_type: &str) -> Result<ApiResponse> {
        self.dispatch(
            self.http
                .get(self.url(&["profile-types", profile_type, "ops"])),
        )
        .await
    }

    /// List the policies attached to a cluster.
    pub async fn list_cluster_policies(&self, cluster_id: &str) -> Result<ApiResponse> {
        self.dispatch(self.http.get(self.url(&["clusters", cluster_id, "policies"])))
            .await
    }

    /// Show one cluster-policy binding.
    pub async fn get_cluster_policy(
        &self,
        cluster_id: &str,
        policy_id: &str,
    ) -> Result<ApiResponse> {
        self.dispatch(
            self.http
                .get(self.url(&["clusters", cluster_id, "policies", policy_id])),
        )
        .await
    }

    /// Collect an attribute across all nodes of a cluster.
    pub async fn cluster_collect(&self, cluster_id: &str, path: &str) -> Result<ApiResponse> {
        self.dispatch(
            self.http
                .get(self.url(&["clusters", cluster_id, "attrs", path])),
        )
        .await
    }

    /// Maximum API microversion advertised by the service. The version
    /// discovery endpoint answers 300 Multiple Choices.
    pub async fn max_api_version(&self) -> Result<String> {
        let response = self
            .apply_headers(self.http.get(format!("{}/", self.base_url)))
            .send()
            .await?;
        let res = Self::into_api_response(response).await?;

        let versions = res
            .body
            .as_ref()
            .and_then(|b| b.get("versions"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ClientError::InvalidResponse("missing version list in discovery response".into())
            })?;
        versions
            .iter()
            .find(|v| v.get("id").and_then(Value::as_str) == Some("1.0"))
            .and_then(|v| v.get("max_version"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                ClientError::InvalidResponse("missing max_version in discovery response".into())
            })
    }
}

/// Pull the human-readable message out of an error body, falling back to the
/// raw text. Error payloads look like `{"error": {"code": 409, "message": ...}}`.
fn extract_error_message(body: Option<&Value>, raw: &str) -> String {
    body.and_then(|b| b.get("error"))
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| raw.to_string())
}
