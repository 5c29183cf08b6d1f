#![deny(missing_docs)]

//! # Doodle Models
//!
//! Wire types exchanged with the Doodle message API.
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`message`] | `Message`, `MessageId`, `CreateMessageRequest` |
//! | [`error_body`] | Tagged decoding of the API's error bodies |
//! | [`error`] | Validation errors for outgoing requests |

pub mod error;
pub mod error_body;
pub mod message;

// Re-export all public types at crate root for convenience.
pub use error::*;
pub use error_body::*;
pub use message::*;
