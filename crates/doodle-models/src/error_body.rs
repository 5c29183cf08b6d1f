//! Error bodies returned by the message service.
//!
//! The service reports failures in one of two JSON shapes:
//!
//! ```text
//! { "error": "Unauthorized" }
//! { "error": { "message": "db down", "createdAt": "2024-01-01T00:00:00Z" } }
//! ```
//!
//! [`ApiErrorBody::decode`] turns a raw response body into the matching
//! [`ErrorDetail`] variant, or `None` when the body is neither shape (not
//! JSON at all, or JSON without a usable `error` field).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The `error` member of an error body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ErrorDetail {
    /// `{ "error": "..." }`
    Plain(String),
    /// `{ "error": { "message": "...", "createdAt": "..." } }`
    Detailed {
        /// Human-readable description.
        message: String,
        /// Server-side timestamp of the failure. Strings pass through
        /// verbatim; other JSON values keep their JSON text.
        #[serde(
            rename = "createdAt",
            default,
            deserialize_with = "lenient_timestamp",
            skip_serializing_if = "Option::is_none"
        )]
        created_at: Option<String>,
    },
}

/// Accept any JSON value for `createdAt`; only `message` decides the shape.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// A decoded error body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorBody {
    /// The reported error.
    pub error: ErrorDetail,
}

impl ApiErrorBody {
    /// Body of the `{ "error": "..." }` shape.
    pub fn plain(message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail::Plain(message.into()),
        }
    }

    /// Body of the `{ "error": { "message", "createdAt" } }` shape.
    pub fn detailed(message: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail::Detailed {
                message: message.into(),
                created_at: Some(created_at.into()),
            },
        }
    }

    /// Decode a raw response body, returning `None` for any other shape.
    pub fn decode(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    /// The human-readable message carried by either shape.
    pub fn message(&self) -> &str {
        match &self.error {
            ErrorDetail::Plain(message) | ErrorDetail::Detailed { message, .. } => message,
        }
    }

    /// The server timestamp, present only in the detailed shape.
    pub fn created_at(&self) -> Option<&str> {
        match &self.error {
            ErrorDetail::Plain(_) => None,
            ErrorDetail::Detailed { created_at, .. } => created_at.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_plain() {
        let body = ApiErrorBody::decode(br#"{"error":"x"}"#).unwrap();
        assert_eq!(body.error, ErrorDetail::Plain("x".into()));
        assert_eq!(body.message(), "x");
        assert_eq!(body.created_at(), None);
    }

    #[test]
    fn decode_detailed() {
        let body =
            ApiErrorBody::decode(br#"{"error":{"message":"y","createdAt":"t"}}"#).unwrap();
        assert_eq!(body.message(), "y");
        assert_eq!(body.created_at(), Some("t"));
    }

    #[test]
    fn decode_detailed_without_timestamp() {
        let body = ApiErrorBody::decode(br#"{"error":{"message":"y"}}"#).unwrap();
        assert_eq!(body.message(), "y");
        assert_eq!(body.created_at(), None);
    }

    #[test]
    fn decode_detailed_with_numeric_timestamp() {
        let body =
            ApiErrorBody::decode(br#"{"error":{"message":"y","createdAt":1704067200000}}"#)
                .unwrap();
        assert_eq!(body.message(), "y");
        assert_eq!(body.created_at(), Some("1704067200000"));
    }

    #[test]
    fn decode_detailed_with_null_timestamp() {
        let body = ApiErrorBody::decode(br#"{"error":{"message":"y","createdAt":null}}"#).unwrap();
        assert_eq!(body.created_at(), None);
    }

    #[test]
    fn decode_rejects_other_shapes() {
        assert!(ApiErrorBody::decode(b"<html>Bad Gateway</html>").is_none());
        assert!(ApiErrorBody::decode(b"").is_none());
        assert!(ApiErrorBody::decode(br#"{"message":"no error key"}"#).is_none());
        assert!(ApiErrorBody::decode(br#"{"error":{"message":42}}"#).is_none());
        assert!(ApiErrorBody::decode(br#"{"error":null}"#).is_none());
    }

    #[test]
    fn serialize_matches_wire_shapes() {
        assert_eq!(
            serde_json::to_value(ApiErrorBody::plain("Unauthorized")).unwrap(),
            json!({ "error": "Unauthorized" })
        );
        assert_eq!(
            serde_json::to_value(ApiErrorBody::detailed("db down", "2024-01-01T00:00:00Z"))
                .unwrap(),
            json!({ "error": { "message": "db down", "createdAt": "2024-01-01T00:00:00Z" } })
        );
    }
}
