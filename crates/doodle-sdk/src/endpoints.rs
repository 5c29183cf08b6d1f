//! Canonical REST paths of the message service.
//!
//! Both the client and the mock server build their paths through
//! [`Endpoints`], so the two sides agree on one layout:
//!
//! ```text
//! {base}/messages          ← GET (list), POST (create)
//! /api/v1/messages         ← route mounted by the mock server
//! ```

/// Version prefix under which the service mounts its routes.
pub const API_PREFIX: &str = "/api/v1";

/// Path of the message collection, relative to the API root.
pub const MESSAGES: &str = "/messages";

/// Central authority for message-service paths.
///
/// # Examples
///
/// ```
/// use doodle_sdk::Endpoints;
///
/// assert_eq!(
///     Endpoints::messages("http://localhost:3000/api/v1/"),
///     "http://localhost:3000/api/v1/messages",
/// );
/// assert_eq!(Endpoints::messages_route(), "/api/v1/messages");
/// ```
pub struct Endpoints;

impl Endpoints {
    /// Absolute URL of the message collection under `base_url`.
    pub fn messages(base_url: &str) -> String {
        format!("{}{MESSAGES}", base_url.trim_end_matches('/'))
    }

    /// Server-side route of the message collection.
    pub fn messages_route() -> String {
        format!("{API_PREFIX}{MESSAGES}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_url_without_trailing_slash() {
        assert_eq!(
            Endpoints::messages("https://chat.example.com/api/v1"),
            "https://chat.example.com/api/v1/messages"
        );
    }

    #[test]
    fn messages_url_strips_trailing_slashes() {
        assert_eq!(
            Endpoints::messages("http://localhost:3000//"),
            "http://localhost:3000/messages"
        );
    }

    #[test]
    fn route_matches_default_base() {
        let default_url = Endpoints::messages(crate::config::DEFAULT_BASE_URL);
        assert!(default_url.ends_with(&Endpoints::messages_route()));
    }
}
