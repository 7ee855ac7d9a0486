//! Face capture endpoints.
//!
//! The capture widget posts the still it took as a data URL.

use axum::Json;
use ecomai_core::{Email, ImageDataUrl};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use super::ApiError;
use crate::middleware::set_current_user;
use crate::models::CurrentUser;
use crate::services::WebShop;

/// `POST /api/auth/face-login` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceLoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub image_base64: String,
}

/// `POST /api/account/face` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceRegisterRequest {
    #[serde(default)]
    pub image_base64: String,
}

/// Success response; `redirect` tells the widget where to go next.
#[derive(Debug, Serialize)]
pub struct FaceResponse {
    pub ok: bool,
    pub redirect: Option<&'static str>,
}

fn parse_image(raw: &str) -> Result<ImageDataUrl, ApiError> {
    if raw.trim().is_empty() {
        return Err(ApiError::bad_request("Please take a photo first"));
    }
    ImageDataUrl::parse(raw).map_err(|e| ApiError::bad_request(format!("Invalid photo: {e}")))
}

/// Log in with a captured face.
///
/// POST /api/auth/face-login
///
/// # Errors
///
/// Returns 400 for a missing email or photo, and the backend's message with
/// 401 when the face is not recognized.
#[instrument(skip_all)]
pub async fn login(
    session: Session,
    shop: WebShop,
    Json(request): Json<FaceLoginRequest>,
) -> Result<Json<FaceResponse>, ApiError> {
    if request.email.trim().is_empty() {
        return Err(ApiError::bad_request("Please enter your email"));
    }
    let email = Email::parse(&request.email)
        .map_err(|e| ApiError::bad_request(format!("Invalid email: {e}")))?;
    let image = parse_image(&request.image_base64)?;

    shop.biometric_login(&email, &image).await?;

    let user = CurrentUser {
        email,
        full_name: None,
    };
    set_current_user(&session, &user).await.map_err(|e| {
        tracing::error!("Failed to set session: {}", e);
        ApiError {
            status: axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            error: "Your session could not be saved. Please try again.".to_string(),
        }
    })?;

    Ok(Json(FaceResponse {
        ok: true,
        redirect: Some("/account"),
    }))
}

/// Register the captured face for the logged-in account.
///
/// POST /api/account/face
///
/// # Errors
///
/// Returns 401 without calling the backend when no token is stored.
#[instrument(skip_all)]
pub async fn register(
    shop: WebShop,
    Json(request): Json<FaceRegisterRequest>,
) -> Result<Json<FaceResponse>, ApiError> {
    let image = parse_image(&request.image_base64)?;
    shop.register_face(&image).await?;

    Ok(Json(FaceResponse {
        ok: true,
        redirect: None,
    }))
}
