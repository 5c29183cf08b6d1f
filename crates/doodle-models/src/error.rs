//! Error types for the `doodle-models` crate.
//!
//! Validation of outgoing requests returns variants of [`ModelError`].

/// Errors produced when validating model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A required field was missing or blank.
    #[error("missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: String,
    },

    /// A message text exceeded the maximum length.
    #[error("message is {len} characters long, the limit is {max}")]
    MessageTooLong {
        /// Length of the rejected text, in characters.
        len: usize,
        /// The configured limit.
        max: usize,
    },
}
