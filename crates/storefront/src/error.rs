//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. Route handlers that have no page to re-render
//! return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::backend::BackendError;
use crate::services::{ShopError, TokenStoreError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// A backend or chat service call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// The session token could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] TokenStoreError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ShopError> for AppError {
    fn from(err: ShopError) -> Self {
        match err {
            ShopError::Backend(e) => Self::Backend(e),
            ShopError::Store(e) => Self::Session(e),
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Backend(err) => backend_status(err),
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            // Backend messages are written for shoppers
            Self::Backend(err) => err.user_message(),
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Report server-side faults to Sentry.
    pub(crate) fn report(&self) {
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();
        (self.status(), self.client_message()).into_response()
    }
}

/// HTTP status to answer with when a backend call fails.
///
/// Client errors reported by the backend stay client errors; anything the
/// backend could not answer properly is a bad gateway.
#[must_use]
pub fn backend_status(err: &BackendError) -> StatusCode {
    match err {
        BackendError::MissingToken | BackendError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        BackendError::Api { status: 404, .. } => StatusCode::NOT_FOUND,
        BackendError::Api { status, .. } if (400..500).contains(status) => StatusCode::BAD_REQUEST,
        BackendError::Api { .. } | BackendError::Http(_) | BackendError::Parse(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

/// HTTP status to answer with when a shop operation fails.
#[must_use]
pub fn shop_status(err: &ShopError) -> StatusCode {
    match err {
        ShopError::Backend(e) => backend_status(e),
        ShopError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
