//! HTTP client for the Doodle message service.
//!
//! [`ApiClient`] wraps the two REST operations behind one contract: every
//! call returns either the decoded success value or an [`ApiError`].
//!
//! # Typical usage
//!
//! ```rust,no_run
//! use doodle_sdk::{ApiClient, ClientConfig, MessageApi};
//!
//! # async fn run() -> Result<(), doodle_sdk::SdkError> {
//! let client = ApiClient::new(&ClientConfig::from_env())?;
//! let created = client.create_message("Alice", "hi").await?;
//! let transcript = client.list_messages().await?;
//! assert!(transcript.iter().any(|m| m.id == created.id));
//! # Ok(())
//! # }
//! ```

use std::future::Future;

use doodle_models::{CreateMessageRequest, Message};
use reqwest::header::CACHE_CONTROL;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::endpoints::Endpoints;
use crate::error::{ApiError, SdkError};

/// The two operations of the message service.
///
/// [`ApiClient`] is the production implementation; the session controller
/// is generic over this trait so it can run against a test double.
pub trait MessageApi: Send + Sync + 'static {
    /// Fetch the full transcript, in server order.
    fn list_messages(&self) -> impl Future<Output = Result<Vec<Message>, ApiError>> + Send;

    /// Create a message. `author` and `text` are expected to be trimmed.
    fn create_message(
        &self,
        author: &str,
        text: &str,
    ) -> impl Future<Output = Result<Message, ApiError>> + Send;
}

/// Authenticated client for the message service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    messages_url: String,
    auth_token: String,
}

impl ApiClient {
    /// Build a client from configuration.
    ///
    /// Fails when the base URL is not an `http(s)` URL or the underlying
    /// HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, SdkError> {
        let base = config.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(SdkError::Config(format!(
                "base URL must start with http:// or https://, got {base:?}"
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            messages_url: Endpoints::messages(base),
            auth_token: config.auth_token.clone(),
        })
    }

    /// URL of the message collection this client talks to.
    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }

    /// Attach credentials, send, and normalize the outcome.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request
            .bearer_auth(&self.auth_token)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, url = %self.messages_url, "request did not reach the server");
                ApiError::Unreachable
            })?;

        let status = response.status();
        let body = response.bytes().await;

        if !status.is_success() {
            let err = ApiError::from_response(status, &body.unwrap_or_default());
            warn!(status = status.as_u16(), error = %err, "message service returned an error");
            return Err(err);
        }

        let body = body.map_err(|e| ApiError::InvalidResponse {
            status: status.as_u16(),
            reason: e.to_string(),
        })?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        serde_json::from_slice(&body).map_err(|e| {
            warn!(status = status.as_u16(), error = %e, "response body did not decode");
            ApiError::InvalidResponse {
                status: status.as_u16(),
                reason: e.to_string(),
            }
        })
    }
}

impl MessageApi for ApiClient {
    async fn list_messages(&self) -> Result<Vec<Message>, ApiError> {
        debug!(url = %self.messages_url, "GET messages");
        self.execute(self.http.get(&self.messages_url)).await
    }

    async fn create_message(&self, author: &str, text: &str) -> Result<Message, ApiError> {
        debug!(url = %self.messages_url, author, "POST message");
        let body = CreateMessageRequest::new(author, text);
        let request = self
            .http
            .post(&self.messages_url)
            .header(CACHE_CONTROL, "no-store")
            .json(&body);
        self.execute(request).await
    }
}
