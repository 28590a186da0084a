//! PHPIPAM sessions and token management.
//!
//! A [`Session`] owns the configuration, the HTTP client and the current API
//! token. It is meant to be created once and shared through an `Arc` by every
//! controller that talks to the same PHPIPAM integration.
//!
//! Tokens are acquired lazily. The first call that finds no usable token takes
//! the login gate and performs the exchange; callers that queue up behind it
//! re-check the token once they get the gate and reuse the fresh one, so at
//! most one login is ever in flight.

use crate::config::Config;
use crate::envelope;
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("phpipam-core/", env!("CARGO_PKG_VERSION"));

/// Path of the login exchange, relative to `{endpoint}/{app_id}`.
pub const LOGIN_PATH: &str = "/user/";

/// Header carrying the token on every authenticated request.
pub const TOKEN_HEADER: &str = "token";

/// Tokens expiring within this many seconds are treated as already expired.
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 30;

/// Layout of the `expires` member returned by the login exchange.
const EXPIRES_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An API token and the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct Token {
    value: SecretString,
    expires: Option<DateTime<Utc>>,
}

impl Token {
    /// Wrap a token string. `expires` of `None` means the token never expires,
    /// which is also how a static app code is used.
    #[must_use]
    pub fn new(value: impl Into<String>, expires: Option<DateTime<Utc>>) -> Self {
        Self {
            value: SecretString::from(value.into()),
            expires,
        }
    }

    /// The raw token, for the request header.
    #[must_use]
    pub fn secret(&self) -> &str {
        self.value.expose_secret()
    }

    /// Expiry reported by PHPIPAM, if any.
    #[must_use]
    pub const fn expires(&self) -> Option<DateTime<Utc>> {
        self.expires
    }

    /// Whether the token can still be sent at `now`.
    #[must_use]
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        if self.secret().is_empty() {
            return false;
        }
        match self.expires {
            Some(expires) => now + TimeDelta::seconds(TOKEN_EXPIRY_SKEW_SECS) < expires,
            None => true,
        }
    }

    /// Whether the token can still be sent right now.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.is_usable_at(Utc::now())
    }

    /// Drop an expiry that is already within the skew window at `now`.
    ///
    /// PHPIPAM reports `expires` in the server's local time without an offset,
    /// so a server west of UTC can hand out a token that looks stale on arrival.
    /// Such a token is kept without an expiry and retired by the first 401.
    #[must_use]
    pub fn without_stale_expiry(self, now: DateTime<Utc>) -> Self {
        match self.expires {
            Some(expires) if now + TimeDelta::seconds(TOKEN_EXPIRY_SKEW_SECS) >= expires => {
                warn!(%expires, "token expiry already passed, treating token as non-expiring");
                Self {
                    expires: None,
                    ..self
                }
            }
            _ => self,
        }
    }

    fn same_as(&self, other: &Self) -> bool {
        self.secret() == other.secret()
    }
}

/// `data` member of a successful login envelope.
#[derive(Debug, Deserialize)]
struct LoginData {
    token: String,
    #[serde(default)]
    expires: Option<String>,
}

impl From<LoginData> for Token {
    fn from(data: LoginData) -> Self {
        let expires = data.expires.as_deref().and_then(|raw| {
            let parsed = parse_expiry(raw);
            if parsed.is_none() {
                warn!(expires = raw, "unrecognised token expiry, treating token as non-expiring");
            }
            parsed
        });
        Self::new(data.token, expires)
    }
}

/// Parse PHPIPAM's `YYYY-MM-DD HH:MM:SS` expiry (taken as UTC), or RFC 3339.
fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, EXPIRES_FORMAT)
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
        .ok()
}

/// The credential exchange a [`Session`] performs when it needs a token.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchange the configured credentials for a fresh token.
    async fn login(&self, config: &Config) -> Result<Token>;
}

/// Logs in through `POST {endpoint}/{app_id}/user/` with HTTP basic auth.
#[derive(Debug, Clone)]
pub struct HttpAuthenticator {
    http: reqwest::Client,
}

impl HttpAuthenticator {
    /// Create an authenticator that sends its requests through `http`.
    #[must_use]
    pub const fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Authenticator for HttpAuthenticator {
    async fn login(&self, config: &Config) -> Result<Token> {
        let url = config.api_url(LOGIN_PATH)?;
        debug!(%url, user = %config.username, "requesting PHPIPAM token");

        let response = self
            .http
            .post(url)
            .basic_auth(&config.username, Some(config.password()))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::AuthError(format!("login request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::AuthError(format!("failed to read login response: {e}")))?;

        let data: LoginData = envelope::unwrap_response(status, &body).map_err(|e| match e {
            Error::ApiError { message, .. } => Error::AuthError(message),
            other => Error::AuthError(other.to_string()),
        })?;

        Ok(Token::from(data))
    }
}

/// Connection state shared by every controller of one PHPIPAM integration.
pub struct Session {
    config: Config,
    http: reqwest::Client,
    authenticator: Box<dyn Authenticator>,
    token: RwLock<Option<Token>>,
    login_gate: Mutex<()>,
}

impl Session {
    /// Create a session that logs in over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self> {
        let http = build_http_client(&config)?;
        let authenticator = Box::new(HttpAuthenticator::new(http.clone()));
        Ok(Self::assemble(config, http, authenticator))
    }

    /// Create a session with a custom login exchange.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the HTTP client cannot be built.
    pub fn with_authenticator(config: Config, authenticator: Box<dyn Authenticator>) -> Result<Self> {
        let http = build_http_client(&config)?;
        Ok(Self::assemble(config, http, authenticator))
    }

    fn assemble(config: Config, http: reqwest::Client, authenticator: Box<dyn Authenticator>) -> Self {
        Self {
            config,
            http,
            authenticator,
            token: RwLock::new(None),
            login_gate: Mutex::new(()),
        }
    }

    /// Seed the session with a token obtained elsewhere.
    #[must_use]
    pub fn with_token(self, token: Token) -> Self {
        Self {
            token: RwLock::new(Some(token)),
            ..self
        }
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) const fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Absolute URL for a resource path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] if the URL cannot be built.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        self.config.api_url(path)
    }

    /// Snapshot of the stored token, usable or not.
    pub async fn current_token(&self) -> Option<Token> {
        self.token.read().await.clone()
    }

    /// Exchange the credentials for a new token and store it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthError`] if the exchange fails for any reason.
    pub async fn login(&self) -> Result<Token> {
        let _gate = self.login_gate.lock().await;
        self.login_locked().await
    }

    /// Return the stored token if it is usable, otherwise log in once.
    ///
    /// # Errors
    ///
    /// Returns the [`Error::AuthError`] of the login exchange.
    pub async fn ensure_token(&self) -> Result<Token> {
        if let Some(token) = self.usable_token().await {
            return Ok(token);
        }

        let _gate = self.login_gate.lock().await;
        // Another caller may have logged in while we waited for the gate.
        if let Some(token) = self.usable_token().await {
            return Ok(token);
        }

        self.login_locked().await
    }

    /// Forget `stale` if it is still the stored token. Returns whether it was dropped.
    pub async fn invalidate_token(&self, stale: &Token) -> bool {
        let mut stored = self.token.write().await;
        if stored.as_ref().is_some_and(|current| current.same_as(stale)) {
            warn!(endpoint = %self.config.endpoint, "PHPIPAM token rejected, discarding it");
            *stored = None;
            true
        } else {
            false
        }
    }

    async fn usable_token(&self) -> Option<Token> {
        self.token
            .read()
            .await
            .as_ref()
            .filter(|token| token.is_usable())
            .cloned()
    }

    // Caller must hold `login_gate`.
    async fn login_locked(&self) -> Result<Token> {
        debug!(endpoint = %self.config.endpoint, app_id = %self.config.app_id, "logging in to PHPIPAM");

        let token = self
            .authenticator
            .login(&self.config)
            .await
            .map_err(|e| match e {
                Error::AuthError(_) => e,
                other => Error::AuthError(other.to_string()),
            })?
            .without_stale_expiry(Utc::now());

        debug!(expires = ?token.expires(), "PHPIPAM login succeeded");
        *self.token.write().await = Some(token.clone());
        Ok(token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.config.endpoint)
            .field("app_id", &self.config.app_id)
            .field("username", &self.config.username)
            .finish_non_exhaustive()
    }
}

fn build_http_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(USER_AGENT)
        .danger_accept_invalid_certs(!config.tls_verify)
        .build()
        .map_err(|e| Error::ConfigError(format!("failed to build HTTP client: {e}")))
}
