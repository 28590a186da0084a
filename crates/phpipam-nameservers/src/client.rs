//! Nameserver controller.

use crate::models::Nameserver;
use crate::Result;
use phpipam_core::{Client, Session};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

const NAMESERVERS_PATH: &str = "/tools/nameservers/";

fn nameserver_path(id: u64) -> String {
    format!("{NAMESERVERS_PATH}{id}/")
}

/// CRUD calls for `tools/nameservers`.
#[derive(Debug, Clone)]
pub struct NameserverController {
    client: Client,
}

impl NameserverController {
    /// Create a controller on top of a shared session.
    #[must_use]
    pub const fn new(session: Arc<Session>) -> Self {
        Self {
            client: Client::new(session),
        }
    }

    /// Create a controller reusing an existing dispatcher.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Create a nameserver set. Returns PHPIPAM's confirmation message.
    ///
    /// # Errors
    ///
    /// Returns a [`phpipam_core::Error`] if login, transport or the API call fails,
    /// e.g. [`Error::ApiError`](phpipam_core::Error::ApiError) for a duplicate name.
    pub async fn create_nameserver(&self, nameserver: &Nameserver) -> Result<String> {
        debug!(name = ?nameserver.name, "creating nameserver");
        self.client
            .send_request(Method::POST, NAMESERVERS_PATH, nameserver)
            .await
    }

    /// Fetch a nameserver set by ID.
    ///
    /// # Errors
    ///
    /// Returns [`phpipam_core::Error::ApiError`] if no set has this ID, or any
    /// other [`phpipam_core::Error`] from the request.
    pub async fn get_nameserver_by_id(&self, id: u64) -> Result<Nameserver> {
        self.client
            .send_request(Method::GET, &nameserver_path(id), &json!({}))
            .await
    }

    /// List every nameserver set.
    ///
    /// # Errors
    ///
    /// Returns a [`phpipam_core::Error`] if the request fails or a record does
    /// not decode.
    pub async fn list_nameservers(&self) -> Result<Vec<Nameserver>> {
        self.client
            .send_request(Method::GET, NAMESERVERS_PATH, &json!({}))
            .await
    }

    /// Update a nameserver set. The ID travels inside the record.
    ///
    /// # Errors
    ///
    /// Returns a [`phpipam_core::Error`] if the request fails or PHPIPAM rejects
    /// the update.
    pub async fn update_nameserver(&self, nameserver: &Nameserver) -> Result<String> {
        debug!(id = ?nameserver.id, "updating nameserver");
        self.client
            .send_request(Method::PATCH, NAMESERVERS_PATH, nameserver)
            .await
    }

    /// Delete a nameserver set by ID.
    ///
    /// # Errors
    ///
    /// Returns a [`phpipam_core::Error`] if the request fails or the set does not
    /// exist.
    pub async fn delete_nameserver(&self, id: u64) -> Result<String> {
        debug!(id, "deleting nameserver");
        self.client
            .send_request(Method::DELETE, &nameserver_path(id), &json!({}))
            .await
    }
}
