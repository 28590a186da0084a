//! Nameserver controller for PHPIPAM.
//!
//! Typed create/read/update/delete calls for the `tools/nameservers` resource,
//! built on the shared [`phpipam_core::Client`] dispatcher.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::NameserverController;
pub use models::Nameserver;

/// Convenient result alias that reuses the shared PHPIPAM error type.
pub type Result<T> = phpipam_core::Result<T>;
