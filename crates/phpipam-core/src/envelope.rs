//! The response envelope every PHPIPAM endpoint wraps its payload in.
//!
//! ```json
//! {"code": 200, "success": true, "data": {...}, "message": "..."}
//! ```
//!
//! `data` is polymorphic: a human readable string for mutations, an object or
//! array for reads. It is kept as a [`serde_json::Value`] until the caller
//! names the type it expects.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Wire-level wrapper returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    /// Status code echoed by PHPIPAM (usually mirrors the HTTP status)
    #[serde(default, deserialize_with = "deserialize_code")]
    pub code: i64,

    /// Whether the operation succeeded. PHPIPAM sends a bool or `0`/`1`
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub success: bool,

    /// Payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Error or informational message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Success envelope carrying `data`.
    #[must_use]
    pub const fn success(code: i64, data: T) -> Self {
        Self {
            code,
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

impl Envelope {
    /// Parse a response body as an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DecodeError`] when the body is not an envelope at all,
    /// whatever the HTTP status was.
    pub fn parse(status: u16, body: &str) -> Result<Self> {
        let not_envelope = |reason: String| Error::DecodeError {
            status,
            message: format!("response is not a PHPIPAM envelope: {reason}"),
            body: body.to_string(),
        };

        // Derived struct decoding also takes positional arrays; only objects qualify.
        let value: Value = serde_json::from_str(body).map_err(|e| not_envelope(e.to_string()))?;
        if !value.is_object() {
            return Err(not_envelope("expected a JSON object".to_string()));
        }
        serde_json::from_value(value).map_err(|e| not_envelope(e.to_string()))
    }

    /// Message to report when the envelope signals failure: the `message`
    /// member, else a string `data`.
    #[must_use]
    pub fn failure_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or_else(|| self.data.as_ref().and_then(Value::as_str))
    }

    /// Check the envelope against the HTTP status and hand back its payload.
    ///
    /// A missing `data` member becomes [`Value::Null`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ApiError`] when `status` is outside 2xx or `success`
    /// is false.
    pub fn into_data(self, status: u16, body: &str) -> Result<Value> {
        if !(200..300).contains(&status) || !self.success {
            let message = self
                .failure_message()
                .map_or_else(|| body.trim().to_string(), str::to_string);
            return Err(Error::ApiError {
                status,
                code: self.code,
                message,
                body: body.to_string(),
            });
        }

        Ok(self.data.unwrap_or(Value::Null))
    }
}

/// Decode an envelope payload into the caller's destination type.
///
/// # Errors
///
/// Returns [`Error::DecodeError`] when `data` does not match `T`.
pub fn decode_data<T>(data: Value, status: u16, body: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_json::from_value(data).map_err(|e| Error::DecodeError {
        status,
        message: format!("unexpected data shape: {e}"),
        body: body.to_string(),
    })
}

/// Parse `body` as an envelope, enforce success and decode `data` as `T`.
///
/// # Errors
///
/// [`Error::DecodeError`] for a body or payload of the wrong shape,
/// [`Error::ApiError`] for a failure envelope or non-2xx status.
pub fn unwrap_response<T>(status: u16, body: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let data = Envelope::parse(status, body)?.into_data(status, body)?;
    decode_data(data, status, body)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Int(i64),
    Str(String),
}

fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Loose::deserialize(deserializer)? {
        Loose::Bool(flag) => flag,
        Loose::Int(n) => n != 0,
        Loose::Str(s) => matches!(s.trim(), "1" | "true"),
    })
}

fn deserialize_code<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Loose::deserialize(deserializer)? {
        Loose::Int(n) => Ok(n),
        Loose::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Loose::Bool(_) => Err(serde::de::Error::custom("envelope code must be a number")),
    }
}

/// Deserialize an optional numeric ID sent either as a JSON number or as a
/// numeric string (PHPIPAM does both depending on version and resource).
///
/// # Errors
///
/// Fails for booleans and non-numeric strings.
pub fn deserialize_optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Int(n)) => u64::try_from(n).map(Some).map_err(serde::de::Error::custom),
        Some(Loose::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(Loose::Str(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
        Some(Loose::Bool(_)) => Err(serde::de::Error::custom("id must be a number")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_mutation_envelope() {
        let body = r#"{"code":201,"success":true,"data":"Nameserver created"}"#;
        let message: String = unwrap_response(201, body).unwrap();
        assert_eq!(message, "Nameserver created");
    }

    #[test]
    fn accepts_numeric_success_flag() {
        let envelope = Envelope::parse(200, r#"{"code":"200","success":1,"data":[]}"#).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.code, 200);

        let envelope = Envelope::parse(200, r#"{"code":200,"success":0}"#).unwrap();
        assert!(!envelope.success);
    }

    #[test]
    fn ignores_unknown_members() {
        let body = r#"{"code":200,"success":true,"data":"ok","time":0.004}"#;
        let message: String = unwrap_response(200, body).unwrap();
        assert_eq!(message, "ok");
    }

    #[test]
    fn success_false_is_api_error() {
        let body = r#"{"code":409,"success":false,"message":"Nameserver exists"}"#;
        let err = unwrap_response::<String>(200, body).unwrap_err();
        assert_eq!(
            err,
            Error::ApiError {
                status: 200,
                code: 409,
                message: "Nameserver exists".to_string(),
                body: body.to_string(),
            }
        );
    }

    #[test]
    fn non_2xx_is_api_error_even_with_success_flag() {
        let body = r#"{"code":500,"success":true,"data":"odd"}"#;
        let err = unwrap_response::<String>(500, body).unwrap_err();
        assert!(matches!(err, Error::ApiError { status: 500, .. }));
        // string data doubles as the failure message
        assert_eq!(
            err,
            Error::ApiError {
                status: 500,
                code: 500,
                message: "odd".to_string(),
                body: body.to_string(),
            }
        );
    }

    #[test]
    fn failure_without_message_uses_raw_body() {
        let body = r#"{"code":400,"success":false}"#;
        match unwrap_response::<String>(400, body).unwrap_err() {
            Error::ApiError { message, .. } => assert_eq!(message, body),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_decode_error() {
        let err = unwrap_response::<String>(500, "Internal Server Error").unwrap_err();
        match err {
            Error::DecodeError { status, body, .. } => {
                assert_eq!(status, 500);
                assert_eq!(body, "Internal Server Error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_object_json_is_decode_error() {
        for body in [r#"[200, true, "x"]"#, r#""x""#, "200", "null"] {
            let err = unwrap_response::<String>(200, body).unwrap_err();
            match err {
                Error::DecodeError { status, body: raw, .. } => {
                    assert_eq!(status, 200);
                    assert_eq!(raw, body);
                }
                other => panic!("unexpected error for {body}: {other:?}"),
            }
        }
    }

    #[test]
    fn wrong_data_shape_is_decode_error() {
        let body = r#"{"code":200,"success":true,"data":{"id":3}}"#;
        let err = unwrap_response::<String>(200, body).unwrap_err();
        assert!(matches!(err, Error::DecodeError { status: 200, .. }));
    }

    #[test]
    fn missing_data_decodes_as_unit() {
        unwrap_response::<()>(200, r#"{"code":200,"success":true}"#).unwrap();
    }

    #[test]
    fn envelope_serialization_skips_empty_members() {
        let envelope = Envelope::success(200, json!("ok"));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"code": 200, "success": true, "data": "ok"})
        );
    }

    #[derive(Deserialize)]
    struct WithId {
        #[serde(default, deserialize_with = "deserialize_optional_id")]
        id: Option<u64>,
    }

    #[test]
    fn optional_id_accepts_numbers_and_strings() {
        let parse = |raw: &str| serde_json::from_str::<WithId>(raw).map(|w| w.id);
        assert_eq!(parse(r#"{"id":3}"#).unwrap(), Some(3));
        assert_eq!(parse(r#"{"id":"3"}"#).unwrap(), Some(3));
        assert_eq!(parse(r#"{"id":null}"#).unwrap(), None);
        assert_eq!(parse("{}").unwrap(), None);
        assert!(parse(r#"{"id":"three"}"#).is_err());
        assert!(parse(r#"{"id":-1}"#).is_err());
    }
}
