//! Request dispatch for PHPIPAM controllers.
//!
//! [`Client`] performs one API call end to end: it makes sure the session holds
//! a usable token, sends the request, unwraps the response envelope and decodes
//! `data` into whatever type the caller asks for. There is no retry loop; any
//! failure is returned as soon as it happens.

use crate::envelope::{self, Envelope};
use crate::session::{Session, TOKEN_HEADER};
use crate::{Error, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Generic call-and-decode dispatcher shared by every resource controller.
#[derive(Debug, Clone)]
pub struct Client {
    session: Arc<Session>,
}

impl Client {
    /// Create a dispatcher on top of a shared session.
    #[must_use]
    pub const fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// The session this client sends its requests through.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Perform one API call and decode the envelope's `data` as `R`.
    ///
    /// `body` is serialized as JSON for POST, PATCH and PUT. GET and DELETE
    /// never carry a payload; callers pass an empty object for those.
    ///
    /// # Errors
    ///
    /// - [`Error::AuthError`] if no token could be obtained
    /// - [`Error::InvalidEndpoint`] if the URL cannot be built
    /// - [`Error::InvalidRequest`] if `body` cannot be serialized
    /// - [`Error::TransportError`] if the HTTP exchange fails
    /// - [`Error::ApiError`] for a non-2xx status or `success: false`
    /// - [`Error::DecodeError`] if the body or its `data` has the wrong shape
    pub async fn send_request<B, R>(&self, method: Method, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let (status, text) = self.execute(method, path, body).await?;
        let data = Envelope::parse(status, &text)?.into_data(status, &text)?;
        envelope::decode_data(data, status, &text)
    }

    /// Like [`Client::send_request`], but writes the decoded value into `out`.
    ///
    /// `out` is only assigned once the whole call has succeeded; on error it
    /// keeps its previous value.
    ///
    /// # Errors
    ///
    /// Same as [`Client::send_request`].
    pub async fn send_request_into<B, R>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        out: &mut R,
    ) -> Result<()>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        *out = self.send_request(method, path, body).await?;
        Ok(())
    }

    async fn execute<B>(&self, method: Method, path: &str, body: &B) -> Result<(u16, String)>
    where
        B: Serialize + ?Sized,
    {
        let token = self.session.ensure_token().await?;
        let url = self.session.url_for(path)?;

        let mut request = self
            .session
            .http()
            .request(method.clone(), url.clone())
            .header(TOKEN_HEADER, token.secret())
            .header(ACCEPT, "application/json");

        if carries_body(&method) {
            let payload = serde_json::to_vec(body)
                .map_err(|e| Error::InvalidRequest(format!("failed to serialize body: {e}")))?;
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(payload);
        }

        debug!(%method, %url, "sending PHPIPAM request");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(%method, %url, status = status.as_u16(), "received PHPIPAM response");

        if status == StatusCode::UNAUTHORIZED {
            self.session.invalidate_token(&token).await;
        }
        if !status.is_success() {
            warn!(%method, %url, status = status.as_u16(), "PHPIPAM request failed");
        }

        Ok((status.as_u16(), text))
    }
}

fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PATCH || *method == Method::PUT
}
