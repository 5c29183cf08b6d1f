//! Chat session controller.
//!
//! [`ChatSession`] owns the state of one chat view: transcript, draft,
//! loading/sending flags and the error banner. It never performs I/O
//! itself. Operations that talk to the service return a [`Request`], a
//! boxed future the front end spawns; the [`SessionEvent`] it resolves to
//! is fed back through [`ChatSession::apply`].
//!
//! ```text
//!   mount / refresh / submit ──► Request ──spawn──► SessionEvent
//!            ▲                                           │
//!            └──────────── apply() ◄─────────────────────┘
//! ```

use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use doodle_models::{Message, MessageId, MAX_MESSAGE_LEN};
use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::client::MessageApi;
use crate::error::ApiError;
use crate::identity::IdentityStore;
use crate::time_format::format_time;

/// A pending service call. Spawn it and pass its output to
/// [`ChatSession::apply`].
pub type Request = BoxFuture<'static, SessionEvent>;

/// Completed service call.
#[derive(Debug)]
pub enum SessionEvent {
    /// A listing finished. `seq` identifies the fetch that produced it.
    Listed {
        /// Sequence number assigned when the fetch was issued.
        seq: u64,
        /// Transcript in server order, or the normalized failure.
        result: Result<Vec<Message>, ApiError>,
    },
    /// A create call finished.
    Sent {
        /// The created message as echoed by the service, or the failure.
        result: Result<Message, ApiError>,
    },
}

/// Coarse state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionPhase {
    /// No listing applied yet.
    Loading,
    /// Transcript shown, nothing being sent.
    Idle,
    /// A create request is in flight.
    Sending,
}

/// Which operation raised the current banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    /// A transcript listing failed.
    Fetch,
    /// Creating a message failed.
    Send,
}

/// Error shown above the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    /// Operation that failed.
    pub origin: ErrorOrigin,
    /// Normalized error message.
    pub message: String,
}

/// What the view should do after an event was applied.
#[derive(Default)]
pub struct Reaction {
    /// Request to spawn right away (the re-fetch after a send).
    pub follow_up: Option<Request>,
    /// Scroll the transcript to its newest entry.
    pub scroll_to_latest: bool,
    /// Return focus to the compose field.
    pub focus_input: bool,
}

/// Horizontal placement of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Messages from other authors.
    Left,
    /// The user's own messages.
    Right,
}

/// One row of the rendered transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry<'a> {
    /// Service id, usable as a row key.
    pub id: &'a MessageId,
    pub alignment: Alignment,
    /// Written under the current display name.
    pub own: bool,
    /// Hidden (`None`) for the user's own messages.
    pub author_label: Option<&'a str>,
    pub text: &'a str,
    /// Output of [`format_time`] for the message's creation instant.
    pub time_label: String,
}

/// State of one chat view.
pub struct ChatSession<A, S> {
    api: Arc<A>,
    identity: S,
    author: String,
    messages: Vec<Message>,
    draft: String,
    loading: bool,
    sending: bool,
    error: Option<Banner>,
    /// Sequence number of the most recently issued fetch.
    issued_seq: u64,
    /// Sequence number of the most recently applied listing.
    applied_seq: u64,
}

impl<A: MessageApi, S: IdentityStore> ChatSession<A, S> {
    /// New session for the author currently in `identity`.
    pub fn new(api: Arc<A>, identity: S) -> Self {
        let author = identity.get().unwrap_or_default();
        Self {
            api,
            identity,
            author,
            messages: Vec::new(),
            draft: String::new(),
            loading: true,
            sending: false,
            error: None,
            issued_seq: 0,
            applied_seq: 0,
        }
    }

    /// Initial fetch. The session shows its loading state until a listing
    /// is applied.
    pub fn mount(&mut self) -> Request {
        self.loading = true;
        info!(author = %self.author, "chat session mounted");
        self.fetch()
    }

    /// Re-fetch the transcript (poll tick).
    pub fn refresh(&mut self) -> Request {
        self.fetch()
    }

    fn fetch(&mut self) -> Request {
        self.issued_seq += 1;
        let seq = self.issued_seq;
        let api = Arc::clone(&self.api);
        debug!(seq, "listing issued");
        Box::pin(async move {
            let result = api.list_messages().await;
            SessionEvent::Listed { seq, result }
        })
    }

    /// Replace the compose draft, keeping at most [`MAX_MESSAGE_LEN`] chars.
    pub fn set_draft(&mut self, draft: &str) {
        self.draft = match draft.char_indices().nth(MAX_MESSAGE_LEN) {
            Some((cut, _)) => draft[..cut].to_string(),
            None => draft.to_string(),
        };
    }

    /// Whether [`submit`](Self::submit) would issue a request.
    pub fn can_send(&self) -> bool {
        !self.loading
            && !self.sending
            && !self.draft.trim().is_empty()
            && !self.author.trim().is_empty()
    }

    /// Send the current draft.
    ///
    /// Returns `None` without side effects when sending is not possible
    /// (blank draft or author, initial load pending, send in flight).
    pub fn submit(&mut self) -> Option<Request> {
        if !self.can_send() {
            debug!(
                loading = self.loading,
                sending = self.sending,
                "submit ignored"
            );
            return None;
        }

        self.sending = true;
        if self.banner_origin() == Some(ErrorOrigin::Send) {
            self.error = None;
        }

        let author = self.author.trim().to_string();
        let text = self.draft.trim().to_string();
        let api = Arc::clone(&self.api);
        debug!(author = %author, chars = text.chars().count(), "send issued");
        Some(Box::pin(async move {
            let result = api.create_message(&author, &text).await;
            SessionEvent::Sent { result }
        }))
    }

    /// Apply a completed request to the session state.
    pub fn apply(&mut self, event: SessionEvent) -> Reaction {
        match event {
            SessionEvent::Listed { seq, result } => {
                if seq < self.applied_seq {
                    debug!(seq, applied = self.applied_seq, "stale listing dropped");
                    return Reaction::default();
                }
                self.applied_seq = seq;
                self.loading = false;
                match result {
                    Ok(messages) => {
                        debug!(seq, count = messages.len(), "listing applied");
                        self.messages = messages;
                        if self.banner_origin() == Some(ErrorOrigin::Fetch) {
                            self.error = None;
                        }
                    }
                    Err(e) => {
                        warn!(seq, status = e.status(), error = %e, "listing failed");
                        self.error = Some(Banner {
                            origin: ErrorOrigin::Fetch,
                            message: e.to_string(),
                        });
                    }
                }
                Reaction::default()
            }
            SessionEvent::Sent { result } => {
                self.sending = false;
                match result {
                    Ok(created) => {
                        info!(id = %created.id, "message sent");
                        self.draft.clear();
                        let author = self.author.trim().to_string();
                        if let Err(e) = self.identity.set(&author) {
                            warn!(error = %e, "failed to persist author");
                        }
                        self.author = author;
                        Reaction {
                            follow_up: Some(self.fetch()),
                            scroll_to_latest: true,
                            focus_input: true,
                        }
                    }
                    Err(e) => {
                        warn!(status = e.status(), error = %e, "send failed");
                        self.error = Some(Banner {
                            origin: ErrorOrigin::Send,
                            message: e.to_string(),
                        });
                        Reaction {
                            focus_input: true,
                            ..Reaction::default()
                        }
                    }
                }
            }
        }
    }

    fn banner_origin(&self) -> Option<ErrorOrigin> {
        self.error.as_ref().map(|b| b.origin)
    }

    /// Messages of the last applied listing, in server order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Current compose text, untrimmed.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Display name as stored in the identity store.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Whether the first listing is still pending.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether a create request is in flight.
    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Current banner text, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_ref().map(|b| b.message.as_str())
    }

    /// Current banner with its origin, if any.
    pub fn banner(&self) -> Option<&Banner> {
        self.error.as_ref()
    }

    /// Coarse state derived from the loading and sending flags.
    pub fn phase(&self) -> SessionPhase {
        if self.loading {
            SessionPhase::Loading
        } else if self.sending {
            SessionPhase::Sending
        } else {
            SessionPhase::Idle
        }
    }

    /// Render-ready rows for the transcript, times formatted in `tz`.
    pub fn transcript<Tz>(&self, now: DateTime<Utc>, tz: &Tz) -> Vec<TranscriptEntry<'_>>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let me = self.author.trim();
        self.messages
            .iter()
            .map(|m| {
                let own = m.is_authored_by(me);
                TranscriptEntry {
                    id: &m.id,
                    alignment: if own { Alignment::Right } else { Alignment::Left },
                    own,
                    author_label: (!own).then_some(m.author.as_str()),
                    text: &m.text,
                    time_label: format_time(m.created_at, now, tz),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::identity::MemoryIdentityStore;

    // ------------------------------------------------------------------
    // Test double
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct FakeApi {
        listings: Mutex<VecDeque<Result<Vec<Message>, ApiError>>>,
        creates: Mutex<VecDeque<Result<Message, ApiError>>>,
        sent: Mutex<Vec<(String, String)>>,
        list_calls: AtomicUsize,
    }

    impl FakeApi {
        fn push_listing(&self, result: Result<Vec<Message>, ApiError>) {
            self.listings.lock().unwrap().push_back(result);
        }

        fn push_create(&self, result: Result<Message, ApiError>) {
            self.creates.lock().unwrap().push_back(result);
        }

        fn create_calls(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    impl MessageApi for FakeApi {
        async fn list_messages(&self) -> Result<Vec<Message>, ApiError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.listings
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn create_message(&self, author: &str, text: &str) -> Result<Message, ApiError> {
            self.sent
                .lock()
                .unwrap()
                .push((author.to_string(), text.to_string()));
            self.creates
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(msg("created", author, text)))
        }
    }

    fn msg(id: &str, author: &str, text: &str) -> Message {
        Message {
            id: MessageId::from(id),
            author: author.to_string(),
            text: text.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
        }
    }

    fn db_down() -> ApiError {
        ApiError::Status {
            status: 500,
            message: "db down".into(),
            created_at: Some("2024-01-01T00:00:00Z".into()),
        }
    }

    type Session = ChatSession<FakeApi, Arc<MemoryIdentityStore>>;

    fn session_as(author: &str) -> (Arc<FakeApi>, Arc<MemoryIdentityStore>, Session) {
        let api = Arc::new(FakeApi::default());
        let identity = Arc::new(MemoryIdentityStore::with_author(author));
        let session = ChatSession::new(Arc::clone(&api), Arc::clone(&identity));
        (api, identity, session)
    }

    async fn mounted(session: &mut Session) {
        let event = session.mount().await;
        session.apply(event);
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    // ------------------------------------------------------------------
    // Fetching
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn mount_loads_transcript_in_server_order() {
        let (api, _, mut session) = session_as("Alice");
        assert_eq!(session.phase(), SessionPhase::Loading);

        api.push_listing(Ok(vec![
            msg("z", "Bob", "late id first"),
            msg("a", "Carol", "early id second"),
        ]));
        mounted(&mut session).await;

        assert_eq!(session.phase(), SessionPhase::Idle);
        let ids: Vec<&str> = session.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["z", "a"]);
    }

    #[tokio::test]
    async fn failed_listing_keeps_previous_transcript() {
        let (api, _, mut session) = session_as("Alice");
        api.push_listing(Ok(vec![msg("1", "Bob", "hello")]));
        mounted(&mut session).await;

        api.push_listing(Err(db_down()));
        let event = session.refresh().await;
        session.apply(event);

        assert_eq!(session.error(), Some("db down"));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.banner().unwrap().origin, ErrorOrigin::Fetch);
    }

    #[tokio::test]
    async fn failed_mount_leaves_loading_with_banner() {
        let (api, _, mut session) = session_as("Alice");
        api.push_listing(Err(ApiError::Unreachable));
        mounted(&mut session).await;

        assert!(!session.is_loading());
        assert_eq!(
            session.error(),
            Some("Unable to connect to the server. Please check your connection.")
        );
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn successful_fetch_clears_fetch_error() {
        let (api, _, mut session) = session_as("Alice");
        api.push_listing(Err(db_down()));
        mounted(&mut session).await;
        assert!(session.error().is_some());

        api.push_listing(Ok(vec![msg("1", "Bob", "back")]));
        let event = session.refresh().await;
        session.apply(event);
        assert_eq!(session.error(), None);
    }

    #[tokio::test]
    async fn stale_listing_is_ignored() {
        let (api, _, mut session) = session_as("Alice");
        mounted(&mut session).await;

        api.push_listing(Ok(vec![msg("old", "Bob", "older snapshot")]));
        api.push_listing(Ok(vec![
            msg("old", "Bob", "older snapshot"),
            msg("new", "Bob", "newer snapshot"),
        ]));
        let first = session.refresh();
        let second = session.refresh();
        let first_event = first.await;
        let second_event = second.await;

        session.apply(second_event);
        session.apply(first_event);

        let ids: Vec<&str> = session.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["old", "new"]);
    }

    #[tokio::test]
    async fn overlapping_polls_still_update_the_transcript() {
        let (api, _, mut session) = session_as("Alice");
        for n in 1..=5 {
            api.push_listing(Ok(vec![msg(&n.to_string(), "Bob", "tick")]));
        }

        // Each response arrives only after the next poll was already issued.
        let mut pending = session.mount();
        for n in 1..=5 {
            let next = session.refresh();
            let event = pending.await;
            session.apply(event);

            assert!(!session.is_loading());
            assert_eq!(session.messages()[0].id.as_str(), n.to_string());
            pending = next;
        }
    }

    #[tokio::test]
    async fn older_listing_never_replaces_a_newer_one() {
        let (api, _, mut session) = session_as("Alice");
        api.push_listing(Ok(vec![msg("old", "Bob", "first snapshot")]));
        api.push_listing(Ok(vec![msg("new", "Bob", "second snapshot")]));

        let first = session.mount();
        let second = session.refresh();
        let first_event = first.await;
        let second_event = second.await;

        session.apply(second_event);
        assert!(!session.is_loading());
        session.apply(first_event);
        assert_eq!(session.messages()[0].id.as_str(), "new");
    }

    // ------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn blank_draft_or_author_issues_no_request() {
        let (api, _, mut session) = session_as("Alice");
        mounted(&mut session).await;

        session.set_draft("   \n ");
        assert!(session.submit().is_none());

        let (api_b, _, mut nameless) = session_as("  ");
        mounted(&mut nameless).await;
        nameless.set_draft("hi");
        assert!(!nameless.can_send());
        assert!(nameless.submit().is_none());

        assert_eq!(api.create_calls(), 0);
        assert_eq!(api_b.create_calls(), 0);
    }

    #[tokio::test]
    async fn submit_is_ignored_while_loading() {
        let (api, _, mut session) = session_as("Alice");
        let _pending = session.mount();
        session.set_draft("hi");

        assert!(session.submit().is_none());
        assert_eq!(api.create_calls(), 0);
    }

    #[tokio::test]
    async fn double_submit_issues_one_create() {
        let (api, _, mut session) = session_as("Alice");
        mounted(&mut session).await;
        session.set_draft("hi");

        let first = session.submit();
        let second = session.submit();
        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(session.phase(), SessionPhase::Sending);

        let event = first.unwrap().await;
        session.apply(event);
        assert_eq!(api.create_calls(), 1);
        assert!(!session.is_sending());
    }

    #[tokio::test]
    async fn successful_send_clears_draft_and_refetches() {
        let (api, identity, mut session) = session_as("  Alice ");
        mounted(&mut session).await;
        session.set_draft("  hi  ");

        let event = session.submit().unwrap().await;
        let reaction = session.apply(event);

        assert_eq!(
            api.sent.lock().unwrap().as_slice(),
            [("Alice".to_string(), "hi".to_string())]
        );
        assert_eq!(session.draft(), "");
        assert_eq!(identity.get().as_deref(), Some("Alice"));
        assert!(reaction.scroll_to_latest);
        assert!(reaction.focus_input);

        let calls_before = api.list_calls.load(Ordering::SeqCst);
        let follow_up = reaction.follow_up.expect("re-fetch after send");
        session.apply(follow_up.await);
        assert_eq!(api.list_calls.load(Ordering::SeqCst), calls_before + 1);
    }

    #[tokio::test]
    async fn failed_send_keeps_draft_and_survives_poll() {
        let (api, _, mut session) = session_as("Alice");
        mounted(&mut session).await;
        session.set_draft("hi");

        api.push_create(Err(ApiError::Status {
            status: 400,
            message: "Message too long".into(),
            created_at: None,
        }));
        let event = session.submit().unwrap().await;
        let reaction = session.apply(event);

        assert!(reaction.follow_up.is_none());
        assert_eq!(session.draft(), "hi");
        assert_eq!(session.error(), Some("Message too long"));

        api.push_listing(Ok(vec![msg("1", "Bob", "unrelated")]));
        let event = session.refresh().await;
        session.apply(event);
        assert_eq!(session.error(), Some("Message too long"));
        assert_eq!(session.banner().unwrap().origin, ErrorOrigin::Send);
    }

    #[tokio::test]
    async fn next_send_clears_send_error() {
        let (api, _, mut session) = session_as("Alice");
        mounted(&mut session).await;
        session.set_draft("hi");
        api.push_create(Err(ApiError::Unreachable));
        let event = session.submit().unwrap().await;
        session.apply(event);
        assert!(session.error().is_some());

        let pending = session.submit().unwrap();
        assert_eq!(session.error(), None);
        session.apply(pending.await);
        assert_eq!(session.error(), None);
    }

    #[test]
    fn draft_is_capped_at_max_length() {
        let (_, _, mut session) = session_as("Alice");
        session.set_draft(&"é".repeat(MAX_MESSAGE_LEN + 5));
        assert_eq!(session.draft().chars().count(), MAX_MESSAGE_LEN);
    }

    // ------------------------------------------------------------------
    // Transcript view
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn own_messages_are_right_aligned_without_label() {
        let (api, _, mut session) = session_as("Alice");
        mounted(&mut session).await;
        session.set_draft("hi");

        api.push_listing(Ok(vec![
            msg("1", "Bob", "hey"),
            msg("created", "Alice", "hi"),
        ]));
        let event = session.submit().unwrap().await;
        let follow_up = session.apply(event).follow_up.unwrap();
        session.apply(follow_up.await);

        let rows = session.transcript(now(), &Utc);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].alignment, Alignment::Left);
        assert_eq!(rows[0].author_label, Some("Bob"));
        assert!(!rows[0].own);

        assert_eq!(rows[1].alignment, Alignment::Right);
        assert_eq!(rows[1].author_label, None);
        assert_eq!(rows[1].text, "hi");
        assert_eq!(rows[1].time_label, "10:00");
    }

    #[tokio::test]
    async fn own_comparison_is_exact_after_trim() {
        let (api, _, mut session) = session_as(" alice ");
        api.push_listing(Ok(vec![
            msg("1", "alice", "mine"),
            msg("2", "Alice", "someone else"),
        ]));
        mounted(&mut session).await;

        let rows = session.transcript(now(), &Utc);
        assert!(rows[0].own);
        assert!(!rows[1].own);
    }

    #[test]
    fn phase_names() {
        assert_eq!(SessionPhase::Loading.to_string(), "loading");
        assert_eq!(SessionPhase::Sending.to_string(), "sending");
    }
}
