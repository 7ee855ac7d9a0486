//! Assistant widget endpoint.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ApiError;
use crate::state::AppState;

/// `POST /api/chat` body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub context: String,
}

/// Assistant answer. On assistant failure this is the fixed apology.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Pass a message to the assistant.
///
/// POST /api/chat
///
/// # Errors
///
/// Returns 400 for an empty message. Assistant failures are not errors.
#[instrument(skip_all)]
pub async fn send(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("Message cannot be empty"));
    }

    let response = state.chat().reply(message, request.context.trim()).await;
    Ok(Json(ChatResponse { response }))
}
