//! Nameserver data model.

use phpipam_core::envelope::deserialize_optional_id;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A set of DNS servers as stored under Tools > Nameservers.
///
/// Every field is optional on the wire and left out of request bodies when
/// unset. Reads ignore members this type does not know about (`links`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Nameserver {
    /// Display name of the nameserver set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Server addresses delimited by semicolons (`8.8.8.8;8.8.4.4`).
    #[serde(default, alias = "nameSrv1", skip_serializing_if = "Option::is_none")]
    pub namesrv1: Option<String>,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Stringified JSON listing the sections allowed to use this set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<String>,

    /// Date of the last edit, as reported by PHPIPAM.
    #[serde(default, rename = "editDate", skip_serializing_if = "Option::is_none")]
    pub edit_date: Option<String>,

    /// Nameserver ID.
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<u64>,

    /// Custom fields. Only populated when the API integration has "Nest custom
    /// fields" enabled; writes carrying this map fail otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<HashMap<String, Value>>,
}

impl Nameserver {
    /// Split `namesrv1` into individual addresses, skipping blanks.
    #[must_use]
    pub fn addresses(&self) -> Vec<&str> {
        self.namesrv1
            .as_deref()
            .map(|raw| {
                raw.split(';')
                    .map(str::trim)
                    .filter(|addr| !addr.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Set `namesrv1` from a list of addresses.
    #[must_use]
    pub fn with_addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = addresses
            .into_iter()
            .map(|addr| addr.as_ref().trim().to_string())
            .filter(|addr| !addr.is_empty())
            .collect::<Vec<_>>()
            .join(";");
        self.namesrv1 = (!joined.is_empty()).then_some(joined);
        self
    }
}
