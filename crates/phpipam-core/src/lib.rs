//! # phpipam-core
//!
//! Core machinery for talking to the PHPIPAM REST API.
//!
//! Every resource controller is built on the same three pieces: a [`Session`]
//! that owns the credentials and the API token, the [`Client`] dispatcher that
//! performs one call and unwraps PHPIPAM's response envelope, and the shared
//! [`Error`] type.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy for authentication, transport, API and decoding failures
//! - [`config`] - Endpoint and credential configuration
//! - [`envelope`] - The `{code, success, data, message}` wire wrapper
//! - [`session`] - Token acquisition and single-flight refresh
//! - [`client`] - Request dispatch and typed decoding

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod session;

// Re-export commonly used types
pub use client::Client;
pub use config::Config;
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use session::{Authenticator, HttpAuthenticator, Session, Token};
