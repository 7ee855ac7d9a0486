//! Wire types for the backend and chat services.
//!
//! Request bodies borrow from the caller; field names are camelCase on the
//! wire.

use ecomai_core::{Email, ImageDataUrl};
use serde::{Deserialize, Serialize};

/// `POST /api/auth/register`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub full_name: &'a str,
    pub email: &'a Email,
    pub password: &'a str,
}

/// `POST /api/auth/login`
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a Email,
    pub password: &'a str,
}

/// `POST /api/auth/biometric-login`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricLoginRequest<'a> {
    pub email: &'a Email,
    pub image_base64: &'a ImageDataUrl,
}

/// `POST /api/auth/register-face`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterFaceRequest<'a> {
    pub image_base64: &'a ImageDataUrl,
}

/// Successful authentication response.
#[derive(Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// Error body shape; either field may be present.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

/// `POST /chat/generate`
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
    pub context: &'a str,
}

/// Chat service reply.
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}
