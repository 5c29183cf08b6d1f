//! # Doodle SDK
//!
//! Client-side building blocks for the Doodle chat: the HTTP client, its
//! normalized errors, configuration, the persisted identity, and the
//! UI-agnostic state of the entry and chat screens.
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`client`] | `MessageApi` trait and the reqwest-backed `ApiClient` |
//! | [`error`] | `ApiError` (per call) and `SdkError` (everything else) |
//! | [`config`] | `ClientConfig`, environment lookup and defaults |
//! | [`endpoints`] | REST paths shared with the mock server |
//! | [`identity`] | `IdentityStore` and its memory/file backends |
//! | [`poller`] | `PollTimer`, the cancel-on-drop interval task |
//! | [`session`] | `ChatSession` controller |
//! | [`entry`] | `EntryForm` for the display name |
//! | [`time_format`] | Short timestamp labels |

pub mod client;
pub mod config;
pub mod endpoints;
pub mod entry;
pub mod error;
pub mod identity;
pub mod poller;
pub mod session;
pub mod time_format;

pub use client::{ApiClient, MessageApi};
pub use config::ClientConfig;
pub use endpoints::Endpoints;
pub use entry::EntryForm;
pub use error::{ApiError, SdkError};
pub use identity::{FileIdentityStore, IdentityStore, MemoryIdentityStore};
pub use poller::PollTimer;
pub use session::{
    Alignment, Banner, ChatSession, ErrorOrigin, Reaction, Request, SessionEvent, SessionPhase,
    TranscriptEntry,
};
pub use time_format::{format_local, format_time};

// Wire types, so front ends need only this crate.
pub use doodle_models as models;
