//! JSON API used by browser-side widgets.
//!
//! Every failure is answered as `{"error": "..."}` with a matching status, so
//! widgets can show the message inline.

pub mod chat;
pub mod face;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::{AppError, shop_status};
use crate::services::ShopError;

/// Error response for API endpoints.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
}

impl ApiError {
    /// A 400 with a message for the widget.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: msg.into(),
        }
    }
}

impl From<ShopError> for ApiError {
    fn from(err: ShopError) -> Self {
        let status = shop_status(&err);
        let error = err.user_message();
        AppError::from(err).report();
        Self { status, error }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
