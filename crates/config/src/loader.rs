//! Configuration loader for environment variables and `.env` files.
//!
//! Responsibilities:
//! - Load connection settings from environment variables, with explicit
//!   builder setters taking precedence.
//! - Optionally read a `.env` file through `dotenvy`, only when asked.
//!
//! Does NOT handle:
//! - Building the HTTP client itself (see the `corral-client` crate).

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::types::{Config, DEFAULT_TIMEOUT, DEFAULT_WAIT_TIMEOUT};

const ENV_BASE_URL: &str = "CORRAL_BASE_URL";
const ENV_AUTH_TOKEN: &str = "CORRAL_AUTH_TOKEN";
const ENV_SKIP_VERIFY: &str = "CORRAL_SKIP_VERIFY";
const ENV_TIMEOUT_SECS: &str = "CORRAL_TIMEOUT_SECS";
const ENV_WAIT_TIMEOUT_SECS: &str = "CORRAL_WAIT_TIMEOUT_SECS";
const ENV_API_MICROVERSION: &str = "CORRAL_API_MICROVERSION";

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Base URL is required (set {ENV_BASE_URL})")]
    MissingBaseUrl,

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// Builder that merges explicit settings over environment variables.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    base_url: Option<String>,
    auth_token: Option<SecretString>,
    skip_verify: Option<bool>,
    timeout: Option<Duration>,
    wait_timeout: Option<Duration>,
    api_microversion: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a `.env` file if one is present. Must be called explicitly;
    /// plain `load()` never touches the filesystem.
    pub fn load_dotenv(self) -> Self {
        if dotenvy::dotenv().is_ok() {
            debug!("loaded settings from .env file");
        }
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn auth_token(mut self, token: SecretString) -> Self {
        self.auth_token = Some(token);
        self
    }

    pub fn skip_verify(mut self, skip: bool) -> Self {
        self.skip_verify = Some(skip);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    pub fn api_microversion(mut self, version: impl Into<String>) -> Self {
        self.api_microversion = Some(version.into());
        self
    }

    /// Resolve the final configuration.
    pub fn load(self) -> Result<Config, ConfigError> {
        let base_url = self
            .base_url
            .or_else(|| env_var(ENV_BASE_URL))
            .ok_or(ConfigError::MissingBaseUrl)?;

        Url::parse(&base_url).map_err(|e| ConfigError::InvalidValue {
            var: ENV_BASE_URL.to_string(),
            message: e.to_string(),
        })?;

        let auth_token = self
            .auth_token
            .or_else(|| env_var(ENV_AUTH_TOKEN).map(|t| SecretString::new(t.into())));

        let skip_verify = match self.skip_verify {
            Some(skip) => skip,
            None => env_bool(ENV_SKIP_VERIFY)?,
        };

        let timeout = match self.timeout {
            Some(t) => t,
            None => env_duration_secs(ENV_TIMEOUT_SECS)?.unwrap_or(DEFAULT_TIMEOUT),
        };

        let wait_timeout = match self.wait_timeout {
            Some(t) => t,
            None => env_duration_secs(ENV_WAIT_TIMEOUT_SECS)?.unwrap_or(DEFAULT_WAIT_TIMEOUT),
        };

        let api_microversion = self
            .api_microversion
            .or_else(|| env_var(ENV_API_MICROVERSION))
            .unwrap_or_else(|| "latest".to_string());

        Ok(Config {
            base_url,
            auth_token,
            skip_verify,
            timeout,
            wait_timeout,
            api_microversion,
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_bool(name: &str) -> Result<bool, ConfigError> {
    match env_var(name) {
        None => Ok(false),
        Some(v) => match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            other => Err(ConfigError::InvalidValue {
                var: name.to_string(),
                message: format!("expected a boolean, got '{other}'"),
            }),
        },
    }
}

fn env_duration_secs(name: &str) -> Result<Option<Duration>, ConfigError> {
    match env_var(name) {
        None => Ok(None),
        Some(v) => v
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|e| ConfigError::InvalidValue {
                var: name.to_string(),
                message: e.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn load_from_env() {
        temp_env::with_vars(
            [
                (ENV_BASE_URL, Some("http://127.0.0.1:8778")),
                (ENV_AUTH_TOKEN, Some("sekrit")),
                (ENV_WAIT_TIMEOUT_SECS, Some("60")),
            ],
            || {
                let config = ConfigLoader::new().load().unwrap();
                assert_eq!(config.base_url, "http://127.0.0.1:8778");
                assert_eq!(config.auth_token.unwrap().expose_secret(), "sekrit");
                assert_eq!(config.wait_timeout, Duration::from_secs(60));
                assert_eq!(config.timeout, DEFAULT_TIMEOUT);
                assert_eq!(config.api_microversion, "latest");
                assert!(!config.skip_verify);
            },
        );
    }

    #[test]
    fn explicit_setters_override_env() {
        temp_env::with_vars(
            [
                (ENV_BASE_URL, Some("http://env.example:8778")),
                (ENV_WAIT_TIMEOUT_SECS, Some("60")),
            ],
            || {
                let config = ConfigLoader::new()
                    .base_url("http://explicit.example:8778")
                    .wait_timeout(Duration::from_secs(5))
                    .load()
                    .unwrap();
                assert_eq!(config.base_url, "http://explicit.example:8778");
                assert_eq!(config.wait_timeout, Duration::from_secs(5));
            },
        );
    }

    #[test]
    fn missing_base_url_is_an_error() {
        temp_env::with_vars([(ENV_BASE_URL, None::<&str>)], || {
            let err = ConfigLoader::new().load().unwrap_err();
            assert!(matches!(err, ConfigError::MissingBaseUrl));
        });
    }

    #[test]
    fn invalid_base_url_is_an_error() {
        temp_env::with_vars([(ENV_BASE_URL, Some("not a url"))], || {
            let err = ConfigLoader::new().load().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }));
        });
    }

    #[test]
    fn invalid_wait_timeout_is_an_error() {
        temp_env::with_vars(
            [
                (ENV_BASE_URL, Some("http://127.0.0.1:8778")),
                (ENV_WAIT_TIMEOUT_SECS, Some("soon")),
            ],
            || {
                let err = ConfigLoader::new().load().unwrap_err();
                assert!(matches!(err, ConfigError::InvalidValue { .. }));
            },
        );
    }

    #[test]
    fn skip_verify_parses_common_spellings() {
        for (raw, expected) in [("1", true), ("true", true), ("no", false)] {
            temp_env::with_vars(
                [
                    (ENV_BASE_URL, Some("http://127.0.0.1:8778")),
                    (ENV_SKIP_VERIFY, Some(raw)),
                ],
                || {
                    let config = ConfigLoader::new().load().unwrap();
                    assert_eq!(config.skip_verify, expected, "value {raw:?}");
                },
            );
        }
    }
}
