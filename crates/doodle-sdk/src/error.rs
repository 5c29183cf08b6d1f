//! SDK error types.
//!
//! [`ApiError`] is the normalized failure of a single call to the message
//! service. Whatever the backend sent back, callers see one shape: a
//! message, the HTTP status (`0` when the request never reached the
//! network) and an optional server timestamp.
//!
//! [`SdkError`] covers everything else that can go wrong inside the SDK
//! (configuration, local persistence).

use doodle_models::ApiErrorBody;
use reqwest::StatusCode;

/// Message reported when no HTTP response was received at all.
pub const UNREACHABLE_MESSAGE: &str =
    "Unable to connect to the server. Please check your connection.";

/// Message used when an error status has no standard reason phrase.
const FALLBACK_MESSAGE: &str = "An unexpected error occurred";

/// Normalized failure of a message-service call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused, timeout).
    #[error("Unable to connect to the server. Please check your connection.")]
    Unreachable,

    /// The service answered with a non-success status.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or the status reason phrase.
        message: String,
        /// Server-reported timestamp, when the body carried one.
        created_at: Option<String>,
    },

    /// The service answered with success but the body did not decode.
    #[error("unexpected response from server (HTTP {status}): {reason}")]
    InvalidResponse {
        /// HTTP status code.
        status: u16,
        /// Decoder diagnostic.
        reason: String,
    },
}

impl ApiError {
    /// Build the failure for an error response from its status and raw body.
    ///
    /// The body is decoded as one of the two documented error shapes; any
    /// other body, or a blank reported message, falls back to the status's
    /// standard reason phrase.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let decoded = ApiErrorBody::decode(body);
        let reported = decoded
            .as_ref()
            .map(ApiErrorBody::message)
            .filter(|m| !m.trim().is_empty());
        let message = reported
            .or_else(|| status.canonical_reason())
            .unwrap_or(FALLBACK_MESSAGE)
            .to_string();

        Self::Status {
            status: status.as_u16(),
            message,
            created_at: decoded
                .as_ref()
                .and_then(ApiErrorBody::created_at)
                .map(str::to_string),
        }
    }

    /// HTTP status of the failure, `0` when the network was never reached.
    pub fn status(&self) -> u16 {
        match self {
            Self::Unreachable => 0,
            Self::Status { status, .. } | Self::InvalidResponse { status, .. } => *status,
        }
    }

    /// Server-reported timestamp, if any.
    pub fn created_at(&self) -> Option<&str> {
        match self {
            Self::Status { created_at, .. } => created_at.as_deref(),
            Self::Unreachable | Self::InvalidResponse { .. } => None,
        }
    }

    /// Whether the failure happened before any response was received.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Unreachable)
    }
}

/// Error type for SDK operations outside a single API call.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Invalid or missing configuration (e.g. bad URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client construction failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A message-service call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// JSON serialization / deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
