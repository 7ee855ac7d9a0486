//! Authentication route handlers.
//!
//! Password login, registration and face login against the commerce backend.
//! A successful login stores the backend token in the session (through
//! [`WebShop`]) and records the shopper's identity for page chrome.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Query},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use ecomai_core::Email;
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::upload::read_face_upload;
use crate::backend::BackendError;
use crate::error::shop_status;
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::{ShopError, WebShop};

/// Shortest password the registration form accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

impl RegisterForm {
    /// Check the form before calling the backend.
    ///
    /// # Errors
    ///
    /// Returns the message to show next to the form.
    pub fn validate(&self) -> Result<Email, String> {
        if self.full_name.trim().is_empty() {
            return Err("Please enter your name".to_string());
        }
        let email = Email::parse(&self.email).map_err(|e| format!("Invalid email: {e}"))?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            ));
        }
        if self.password != self.password_confirm {
            return Err("Passwords do not match".to_string());
        }
        Ok(email)
    }
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for notices carried across redirects.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Text for a notice code carried in a redirect.
#[must_use]
pub fn notice_text(code: &str) -> Option<&'static str> {
    match code {
        "login_required" => Some("Please log in to continue."),
        "session_expired" => Some("Your session has expired. Please log in again."),
        "logged_out" => Some("You have been logged out."),
        "face_registered" => Some("Your face has been registered. You can now log in with it."),
        "product_created" => Some("Product created."),
        "product_deleted" => Some("Product deleted."),
        _ => None,
    }
}

impl MessageQuery {
    /// Error notice, if the code is known.
    #[must_use]
    pub fn error_text(&self) -> Option<String> {
        self.error.as_deref().and_then(notice_text).map(String::from)
    }

    /// Success notice, if the code is known.
    #[must_use]
    pub fn success_text(&self) -> Option<String> {
        self.success.as_deref().and_then(notice_text).map(String::from)
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub user: Option<CurrentUser>,
    pub email: String,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub user: Option<CurrentUser>,
    pub full_name: String,
    pub email: String,
    pub error: Option<String>,
}

/// Face login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/face_login.html")]
pub struct FaceLoginTemplate {
    pub user: Option<CurrentUser>,
    pub email: String,
    pub error: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Send the shopper to the login page after an authentication failure.
///
/// A token the backend rejected is dropped so the next login starts clean.
pub async fn login_required(shop: &WebShop, session: &Session, err: &ShopError) -> Response {
    let code = if matches!(err, ShopError::Backend(BackendError::Unauthorized { .. })) {
        if let Err(e) = shop.logout().await {
            tracing::error!(error = %e, "Failed to drop rejected token");
        }
        if let Err(e) = clear_current_user(session).await {
            tracing::error!(error = %e, "Failed to clear session user");
        }
        "session_expired"
    } else {
        "login_required"
    };

    Redirect::to(&format!("/auth/login?error={code}")).into_response()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    LoginTemplate {
        user,
        email: String::new(),
        error: query.error_text(),
        success: query.success_text(),
    }
}

/// Handle login form submission.
///
/// On rejection the page is shown again with the backend's message verbatim.
#[instrument(skip_all)]
pub async fn login(session: Session, shop: WebShop, Form(form): Form<LoginForm>) -> Response {
    let render = |status: StatusCode, error: String| {
        (
            status,
            LoginTemplate {
                user: None,
                email: form.email.clone(),
                error: Some(error),
                success: None,
            },
        )
            .into_response()
    };

    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => return render(StatusCode::BAD_REQUEST, format!("Invalid email: {e}")),
    };
    if form.password.is_empty() {
        return render(StatusCode::BAD_REQUEST, "Please enter your password".to_string());
    }

    let password = SecretString::from(form.password.clone());
    if let Err(e) = shop.login(&email, &password).await {
        tracing::warn!(error = %e, "Login failed");
        return render(shop_status(&e), e.user_message());
    }

    let user = CurrentUser {
        email,
        full_name: None,
    };
    if let Err(e) = set_current_user(&session, &user).await {
        tracing::error!("Failed to set session: {}", e);
        return render(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Your session could not be saved. Please try again.".to_string(),
        );
    }

    Redirect::to("/account").into_response()
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    RegisterTemplate {
        user,
        full_name: String::new(),
        email: String::new(),
        error: None,
    }
}

/// Handle registration form submission.
#[instrument(skip_all)]
pub async fn register(session: Session, shop: WebShop, Form(form): Form<RegisterForm>) -> Response {
    let render = |status: StatusCode, error: String| {
        (
            status,
            RegisterTemplate {
                user: None,
                full_name: form.full_name.clone(),
                email: form.email.clone(),
                error: Some(error),
            },
        )
            .into_response()
    };

    let email = match form.validate() {
        Ok(email) => email,
        Err(message) => return render(StatusCode::BAD_REQUEST, message),
    };

    let full_name = form.full_name.trim().to_string();
    let password = SecretString::from(form.password.clone());
    if let Err(e) = shop.register(&full_name, &email, &password).await {
        tracing::warn!(error = %e, "Registration failed");
        return render(shop_status(&e), e.user_message());
    }

    let user = CurrentUser {
        email,
        full_name: Some(full_name),
    };
    if let Err(e) = set_current_user(&session, &user).await {
        tracing::error!("Failed to set session: {}", e);
        return render(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Your session could not be saved. Please try again.".to_string(),
        );
    }

    Redirect::to("/account").into_response()
}

// =============================================================================
// Face Login Routes
// =============================================================================

/// Display the face login page.
pub async fn face_login_page(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    FaceLoginTemplate {
        user,
        email: String::new(),
        error: None,
    }
}

/// Handle a face login upload (email plus captured photo).
#[instrument(skip_all)]
pub async fn face_login(session: Session, shop: WebShop, multipart: Multipart) -> Response {
    let upload = match read_face_upload(multipart).await {
        Ok(upload) => upload,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                FaceLoginTemplate {
                    user: None,
                    email: String::new(),
                    error: Some(message),
                },
            )
                .into_response();
        }
    };

    let render = |status: StatusCode, error: String| {
        (
            status,
            FaceLoginTemplate {
                user: None,
                email: upload.email.clone().unwrap_or_default(),
                error: Some(error),
            },
        )
            .into_response()
    };

    let email = match upload.email() {
        Ok(email) => email,
        Err(message) => return render(StatusCode::BAD_REQUEST, message),
    };
    let image = match upload.image() {
        Ok(image) => image,
        Err(message) => return render(StatusCode::BAD_REQUEST, message),
    };

    if let Err(e) = shop.biometric_login(&email, image).await {
        tracing::warn!(error = %e, "Face login failed");
        return render(shop_status(&e), e.user_message());
    }

    let user = CurrentUser {
        email,
        full_name: None,
    };
    if let Err(e) = set_current_user(&session, &user).await {
        tracing::error!("Failed to set session: {}", e);
        return render(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Your session could not be saved. Please try again.".to_string(),
        );
    }

    Redirect::to("/account").into_response()
}

// =============================================================================
// Logout
// =============================================================================

/// Log out: forget the token and the shopper identity.
#[instrument(skip_all)]
pub async fn logout(session: Session, shop: WebShop) -> Response {
    if let Err(e) = shop.logout().await {
        tracing::error!(error = %e, "Failed to clear token");
    }
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!(error = %e, "Failed to clear session user");
    }

    Redirect::to("/auth/login?success=logged_out").into_response()
}
