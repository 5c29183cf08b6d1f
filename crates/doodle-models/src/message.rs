//! Chat message types.
//!
//! A [`Message`] is created and owned by the message service; clients only
//! ever hold read-only copies. New messages are submitted as a
//! [`CreateMessageRequest`].
//!
//! The service speaks the field names `_id`, `message`, `author` and
//! `createdAt`. The Rust side uses `id` and `text`; `serde` renames map the
//! two, and the aliases accept payloads that already use `id` / `text`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ModelError;

/// Maximum length of a message text, in characters.
pub const MAX_MESSAGE_LEN: usize = 1000;

// ---------------------------------------------------------------------------
// MessageId
// ---------------------------------------------------------------------------

/// Opaque identifier assigned to a message by the service.
///
/// Services that number their messages send the id as a JSON integer; it is
/// kept as its decimal text.
///
/// # Examples
///
/// ```
/// use doodle_models::MessageId;
///
/// let id = MessageId::new("65a1f0c2");
/// assert_eq!(id.to_string(), "65a1f0c2");
/// ```
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(Self(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => s,
            RawId::Unsigned(n) => n.to_string(),
            RawId::Signed(n) => n.to_string(),
        }))
    }
}

impl MessageId {
    /// Create a new `MessageId` from a string slice.
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Return the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A chat message as returned by the service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Service-assigned identifier.
    #[serde(rename = "_id", alias = "id")]
    pub id: MessageId,
    /// Display name of the sender.
    pub author: String,
    /// Message body.
    #[serde(rename = "message", alias = "text")]
    pub text: String,
    /// Creation instant, as recorded by the service.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Whether this message was written under the given display name.
    ///
    /// Comparison is exact; callers pass an already trimmed name.
    pub fn is_authored_by(&self, author: &str) -> bool {
        self.author == author
    }
}

// ---------------------------------------------------------------------------
// CreateMessageRequest
// ---------------------------------------------------------------------------

/// Body of `POST /messages`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateMessageRequest {
    /// Message body.
    pub message: String,
    /// Display name of the sender.
    pub author: String,
}

impl CreateMessageRequest {
    /// Build a request from already trimmed parts.
    pub fn new(author: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            author: author.into(),
        }
    }

    /// Check the request against the service's acceptance rules.
    ///
    /// Both fields must be non-empty after trimming and the message must not
    /// exceed [`MAX_MESSAGE_LEN`] characters.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.author.trim().is_empty() {
            return Err(ModelError::MissingField {
                field: "author".into(),
            });
        }
        if self.message.trim().is_empty() {
            return Err(ModelError::MissingField {
                field: "message".into(),
            });
        }
        let len = self.message.chars().count();
        if len > MAX_MESSAGE_LEN {
            return Err(ModelError::MessageTooLong {
                len,
                max: MAX_MESSAGE_LEN,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
