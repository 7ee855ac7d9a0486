//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Query},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use super::auth::{MessageQuery, login_required};
use super::upload::read_face_upload;
use crate::error::{add_breadcrumb, shop_status};
use crate::filters;
use crate::middleware::auth::RequireAuth;
use crate::models::CurrentUser;
use crate::services::WebShop;

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Face registration page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/face.html")]
pub struct FaceRegisterTemplate {
    pub user: Option<CurrentUser>,
    pub error: Option<String>,
}

/// Display account overview page.
pub async fn index(
    RequireAuth(current_user): RequireAuth,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    AccountIndexTemplate {
        user: Some(current_user),
        error: query.error_text(),
        success: query.success_text(),
    }
}

/// Display the face registration page.
pub async fn face_page(RequireAuth(current_user): RequireAuth) -> impl IntoResponse {
    FaceRegisterTemplate {
        user: Some(current_user),
        error: None,
    }
}

/// Register the uploaded photo as the account's reference face.
#[instrument(skip_all, fields(email = %current_user.email))]
pub async fn register_face(
    RequireAuth(current_user): RequireAuth,
    session: Session,
    shop: WebShop,
    multipart: Multipart,
) -> Response {
    let render = |status: StatusCode, error: String| {
        (
            status,
            FaceRegisterTemplate {
                user: Some(current_user.clone()),
                error: Some(error),
            },
        )
            .into_response()
    };

    let upload = match read_face_upload(multipart).await {
        Ok(upload) => upload,
        Err(message) => return render(StatusCode::BAD_REQUEST, message),
    };
    let image = match upload.image() {
        Ok(image) => image,
        Err(message) => return render(StatusCode::BAD_REQUEST, message),
    };

    match shop.register_face(image).await {
        Ok(()) => {
            add_breadcrumb("account", "Face registered", None);
            Redirect::to("/account?success=face_registered").into_response()
        }
        Err(e) if e.is_auth() => login_required(&shop, &session, &e).await,
        Err(e) => {
            tracing::warn!(error = %e, "Face registration failed");
            render(shop_status(&e), e.user_message())
        }
    }
}
