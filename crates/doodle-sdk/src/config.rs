//! Client configuration.
//!
//! Read once at startup; nothing here is reloaded while the client runs.

use std::time::Duration;

/// Base URL used when `DOODLE_API_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/v1";
/// Bearer token used when `DOODLE_AUTH_TOKEN` is unset.
pub const DEFAULT_AUTH_TOKEN: &str = "super-secret-doodle-token";
/// Poll interval used when `DOODLE_POLL_INTERVAL_MS` is unset or invalid.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(30_000);

/// Settings for talking to the message service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:3000/api/v1`.
    pub base_url: String,
    /// Static bearer credential sent with every request.
    pub auth_token: String,
    /// Delay between two transcript polls.
    pub poll_interval: Duration,
    /// Per-request timeout; `None` leaves the transport default.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: DEFAULT_AUTH_TOKEN.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable                    | Default                        |
    /// |-----------------------------|--------------------------------|
    /// | `DOODLE_API_BASE_URL`       | `http://localhost:3000/api/v1` |
    /// | `DOODLE_AUTH_TOKEN`         | `super-secret-doodle-token`    |
    /// | `DOODLE_POLL_INTERVAL_MS`   | `30000`                        |
    /// | `DOODLE_REQUEST_TIMEOUT_MS` | transport default              |
    ///
    /// Empty values count as unset. Durations must be positive integers,
    /// anything else falls back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            base_url: non_empty("DOODLE_API_BASE_URL").unwrap_or(defaults.base_url),
            auth_token: non_empty("DOODLE_AUTH_TOKEN").unwrap_or(defaults.auth_token),
            poll_interval: non_empty("DOODLE_POLL_INTERVAL_MS")
                .and_then(|v| parse_millis(&v))
                .unwrap_or(defaults.poll_interval),
            request_timeout: non_empty("DOODLE_REQUEST_TIMEOUT_MS").and_then(|v| parse_millis(&v)),
        }
    }

    /// Override the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the bearer token.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = token.into();
        self
    }

    /// Override the poll interval. A zero interval keeps the current one.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.poll_interval = interval;
        }
        self
    }
}

fn parse_millis(raw: &str) -> Option<Duration> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}
