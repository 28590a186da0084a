//! Configuration for PHPIPAM sessions.
//!
//! A [`Config`] names the API endpoint, the API application and the user whose
//! credentials are exchanged for a token.

use crate::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Endpoint used by [`Config::default`].
pub const DEFAULT_ENDPOINT: &str = "http://localhost/api";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection and credential settings for one PHPIPAM API integration.
///
/// The password is kept in a [`SecretString`] so it never shows up in `Debug`
/// output or logs.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    /// API base URL, e.g. `https://ipam.example.com/api`
    #[validate(url)]
    pub endpoint: String,

    /// API application ID, as configured under Administration > API
    #[validate(length(min = 1))]
    pub app_id: String,

    /// User name used for the login exchange
    #[validate(length(min = 1))]
    pub username: String,

    /// Password used for the login exchange
    pub password: SecretString,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,
}

const fn default_request_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_tls_verify() -> bool {
    true
}

impl Config {
    /// Create a new configuration with the required parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the endpoint is not a URL or the app ID
    /// or user name is empty.
    pub fn new(
        endpoint: impl Into<String>,
        app_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, Error> {
        let config = Self {
            endpoint: endpoint.into(),
            app_id: app_id.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
            request_timeout_secs: default_request_timeout_secs(),
            tls_verify: default_tls_verify(),
        };

        config.validated()
    }

    /// Run the field validators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] naming the failing fields.
    pub fn validated(self) -> Result<Self, Error> {
        self.validate()?;
        Ok(self)
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The login password.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Parse the endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_endpoint(&self) -> Result<Url, Error> {
        Url::parse(&self.endpoint)
            .map_err(|e| Error::ConfigError(format!("Invalid endpoint URL: {e}")))
    }

    /// Absolute URL for a resource path: `{endpoint}/{app_id}{path}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the joined string is not a URL.
    pub fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.endpoint.trim_end_matches('/');
        let url = if path.starts_with('/') {
            format!("{base}/{}{path}", self.app_id)
        } else {
            format!("{base}/{}/{path}", self.app_id)
        };
        Ok(Url::parse(&url)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            app_id: String::new(),
            username: String::new(),
            password: SecretString::from(String::new()),
            request_timeout_secs: default_request_timeout_secs(),
            tls_verify: default_tls_verify(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::new("https://ipam.example.com/api", "test", "nobody", "changeit").unwrap()
    }

    #[test]
    fn test_config_new() {
        let config = config();
        assert_eq!(config.endpoint, "https://ipam.example.com/api");
        assert_eq!(config.app_id, "test");
        assert_eq!(config.username, "nobody");
        assert_eq!(config.password(), "changeit");
        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.tls_verify);
    }

    #[test]
    fn test_config_invalid_url() {
        let result = Config::new("not-a-url", "test", "nobody", "changeit");
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_config_empty_app_id() {
        let result = Config::new("https://ipam.example.com/api", "", "nobody", "changeit");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = config().with_timeout(60).with_tls_verify(false);
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert!(!config.tls_verify);
    }

    #[test]
    fn test_config_validation_timeout_range() {
        assert!(config().with_timeout(0).validated().is_err());
        assert!(config().with_timeout(301).validated().is_err());
        assert!(config().with_timeout(300).validated().is_ok());
    }

    #[test]
    fn test_default_is_incomplete() {
        let config = Config::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_api_url() {
        let config = config();
        assert_eq!(
            config.api_url("/tools/nameservers/3/").unwrap().as_str(),
            "https://ipam.example.com/api/test/tools/nameservers/3/"
        );
        assert_eq!(
            config.api_url("user/").unwrap().as_str(),
            "https://ipam.example.com/api/test/user/"
        );
    }

    #[test]
    fn test_api_url_trailing_slash() {
        let config =
            Config::new("https://ipam.example.com/api/", "test", "nobody", "changeit").unwrap();
        assert_eq!(
            config.api_url("/user/").unwrap().as_str(),
            "https://ipam.example.com/api/test/user/"
        );
    }

    #[test]
    fn test_parse_endpoint() {
        let config =
            Config::new("https://ipam.example.com:8443/api", "test", "nobody", "x").unwrap();
        let url = config.parse_endpoint().unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("ipam.example.com"));
        assert_eq!(url.port(), Some(8443));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("changeit"));
    }

    #[test]
    fn test_config_deserialization_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "endpoint": "https://ipam.example.com/api",
                "app_id": "test",
                "username": "nobody",
                "password": "changeit"
            }"#,
        )
        .unwrap();

        assert_eq!(config.request_timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.tls_verify);
        assert_eq!(config.password(), "changeit");
        assert!(config.validated().is_ok());
    }
}
