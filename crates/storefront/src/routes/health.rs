//! Health check handlers.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable when the commerce backend does not answer
/// or answers with a server error.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.backend().is_reachable().await {
        StatusCode::OK
    } else {
        tracing::warn!(backend = %state.backend().base_url(), "Backend not reachable");
        StatusCode::SERVICE_UNAVAILABLE
    }
}
