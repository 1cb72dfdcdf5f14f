//! Session configuration.
//!
//! An `AuthConfig` carries the two client secrets issued to an application
//! plus the base URL of the auth service. It is fixed when a session is
//! built and never changes afterwards.

use std::fmt;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

/// HTTP request timeout in seconds.
/// Matches what the auth service's own clients use for interactive logins.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const ENV_CLIENT_ID: &str = "AUTHROCKET_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "AUTHROCKET_CLIENT_SECRET";
const ENV_BASE_URL: &str = "AUTHROCKET_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "AUTHROCKET_TIMEOUT_SECS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),

    #[error("Invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Clone)]
pub struct AuthConfig {
    client_id: String,
    client_secret: String,
    base_url: String,
    timeout: Duration,
}

impl AuthConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        base_url: impl AsRef<str>,
    ) -> Result<Self, ConfigError> {
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        if client_id.is_empty() {
            return Err(ConfigError::Missing("client_id"));
        }
        if client_secret.is_empty() {
            return Err(ConfigError::Missing("client_secret"));
        }

        Ok(Self {
            client_id,
            client_secret,
            base_url: Self::normalize_base_url(base_url.as_ref())?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Build a config from `AUTHROCKET_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. `from_env` is this over `std::env`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let mut config = Self::new(
            required(ENV_CLIENT_ID)?,
            required(ENV_CLIENT_SECRET)?,
            required(ENV_BASE_URL)?,
        )?;

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_TIMEOUT_SECS,
                value: raw.clone(),
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
        let trimmed = raw.trim().trim_end_matches('/');
        let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        Ok(trimmed.to_string())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_new_strips_trailing_slash() {
        let config = AuthConfig::new("id", "secret", "https://auth.example.com/api/").unwrap();
        assert_eq!(config.base_url(), "https://auth.example.com/api");
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_new_rejects_bad_base_url() {
        assert!(matches!(
            AuthConfig::new("id", "secret", "not a url"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            AuthConfig::new("id", "secret", "ftp://auth.example.com"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_new_rejects_empty_secrets() {
        assert!(matches!(
            AuthConfig::new("", "secret", "https://auth.example.com"),
            Err(ConfigError::Missing("client_id"))
        ));
        assert!(matches!(
            AuthConfig::new("id", "", "https://auth.example.com"),
            Err(ConfigError::Missing("client_secret"))
        ));
    }

    #[test]
    fn test_from_lookup() {
        let config = AuthConfig::from_lookup(lookup_from(&[
            (ENV_CLIENT_ID, "app1"),
            (ENV_CLIENT_SECRET, "s3cret"),
            (ENV_BASE_URL, "http://localhost:8000"),
            (ENV_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();

        assert_eq!(config.client_id(), "app1");
        assert_eq!(config.client_secret(), "s3cret");
        assert_eq!(config.base_url(), "http://localhost:8000");
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_from_lookup_missing_and_invalid() {
        let missing = AuthConfig::from_lookup(lookup_from(&[(ENV_CLIENT_ID, "app1")]));
        assert!(matches!(missing, Err(ConfigError::Missing(ENV_CLIENT_SECRET))));

        let bad_timeout = AuthConfig::from_lookup(lookup_from(&[
            (ENV_CLIENT_ID, "app1"),
            (ENV_CLIENT_SECRET, "s3cret"),
            (ENV_BASE_URL, "http://localhost:8000"),
            (ENV_TIMEOUT_SECS, "soon"),
        ]));
        assert!(matches!(bad_timeout, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = AuthConfig::new("id", "top-secret", "https://auth.example.com").unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("top-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
