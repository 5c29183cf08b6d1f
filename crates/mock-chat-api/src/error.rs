//! Error type of the mock service.
//!
//! [`MockApiError`] implements [`axum::response::IntoResponse`] and renders
//! the same two error-body shapes the real service produces.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use doodle_models::{ApiErrorBody, ModelError};

#[derive(Debug, thiserror::Error)]
pub enum MockApiError {
    /// Missing or wrong bearer token.
    #[error("Unauthorized")]
    Unauthorized,

    /// The request body broke an acceptance rule.
    #[error("{0}")]
    Invalid(#[from] ModelError),

    /// The body was not a `{message, author}` JSON object.
    #[error("invalid request body: {0}")]
    MalformedBody(String),

    /// Simulated backend failure (`--outage`).
    #[error("Service temporarily unavailable")]
    Outage,
}

impl IntoResponse for MockApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, ApiErrorBody::plain(self.to_string())),
            Self::Invalid(_) | Self::MalformedBody(_) => {
                (StatusCode::BAD_REQUEST, ApiErrorBody::plain(self.to_string()))
            }
            Self::Outage => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody::detailed(
                    self.to_string(),
                    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                ),
            ),
        };

        tracing::warn!(%status, error = %self, "request rejected");
        (status, Json(body)).into_response()
    }
}
