//! In-memory stand-in for the Doodle message API.
//!
//! Serves the two message routes with the same authentication, success
//! bodies and error bodies as the real service, so the client can be run
//! and tested without a backend:
//!
//! | Route | Behavior |
//! |-------|----------|
//! | `GET /api/v1/messages` | transcript in insertion order |
//! | `POST /api/v1/messages` | `201` with the stored message |
//! | `GET /health` | `"ok"` |

pub mod error;

use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use doodle_models::{CreateMessageRequest, Message, MessageId};
use doodle_sdk::Endpoints;
use tracing::info;

pub use crate::error::MockApiError;

/// Startup options of the mock service.
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Bearer token every message request must present.
    pub token: String,
    /// Answer every message request with a `500`.
    pub outage: bool,
}

struct AppState {
    config: MockConfig,
    messages: Mutex<Vec<Message>>,
}

impl AppState {
    fn authorize(&self, headers: &HeaderMap) -> Result<(), MockApiError> {
        if self.config.outage {
            return Err(MockApiError::Outage);
        }
        let expected = format!("Bearer {}", self.config.token);
        match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some(value) if value == expected => Ok(()),
            _ => Err(MockApiError::Unauthorized),
        }
    }
}

/// Build the mock service router.
pub fn router(config: MockConfig) -> Router {
    let state = Arc::new(AppState {
        config,
        messages: Mutex::new(Vec::new()),
    });

    Router::new()
        .route(
            &Endpoints::messages_route(),
            get(list_messages).post(create_message),
        )
        .route("/health", get(health))
        .with_state(state)
}

async fn list_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Message>>, MockApiError> {
    state.authorize(&headers)?;
    let messages = state
        .messages
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    Ok(Json(messages))
}

async fn create_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Message>), MockApiError> {
    state.authorize(&headers)?;
    let Json(request) = body.map_err(|e| MockApiError::MalformedBody(e.body_text()))?;
    request.validate()?;

    let message = Message {
        id: MessageId::new(&uuid::Uuid::new_v4().to_string()),
        author: request.author.trim().to_string(),
        text: request.message.trim().to_string(),
        created_at: Utc::now(),
    };
    info!(id = %message.id, author = %message.author, "message stored");

    state
        .messages
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(message.clone());
    Ok((StatusCode::CREATED, Json(message)))
}

async fn health() -> &'static str {
    "ok"
}
