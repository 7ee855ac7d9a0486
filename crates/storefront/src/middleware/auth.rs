//! Authentication extractors and session helpers.
//!
//! A shopper counts as logged in when the session holds a [`CurrentUser`].
//! Login handlers store it next to the bearer token; logout removes both.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in shopper.
///
/// HTML requests are redirected to the login page; `/api/` requests get 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.display_name())
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Error returned when authentication is required but the shopper is not logged in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                axum::Json(serde_json::json!({ "error": "Not authenticated" })),
            )
                .into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let is_api = parts.uri.path().starts_with("/api/");
        let rejection = || {
            if is_api {
                AuthRejection::Unauthorized
            } else {
                AuthRejection::RedirectToLogin
            }
        };

        let session = parts.extensions.get::<Session>().ok_or_else(rejection)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or_else(rejection)?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current shopper.
///
/// Unlike `RequireAuth`, this never rejects the request.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Record the logged-in shopper in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await?;

    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(user.email.to_string()),
            ..Default::default()
        }));
    });
    Ok(())
}

/// Remove the shopper from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;

    sentry::configure_scope(|scope| scope.set_user(None));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use ecomai_core::Email;
    use tower_sessions::MemoryStore;

    use super::*;

    fn parts_for(uri: &str, session: Option<Session>) -> Parts {
        let (mut parts, ()) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        if let Some(session) = session {
            parts.extensions.insert(session);
        }
        parts
    }

    fn new_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_require_auth_redirects_html_and_rejects_api() {
        let mut html = parts_for("/account", Some(new_session()));
        assert!(matches!(
            RequireAuth::from_request_parts(&mut html, &()).await,
            Err(AuthRejection::RedirectToLogin)
        ));

        let mut api = parts_for("/api/account/face", Some(new_session()));
        assert!(matches!(
            RequireAuth::from_request_parts(&mut api, &()).await,
            Err(AuthRejection::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_set_and_clear_current_user() {
        let session = new_session();
        let user = CurrentUser {
            email: Email::parse("ana@example.com").unwrap(),
            full_name: None,
        };
        set_current_user(&session, &user).await.unwrap();

        let mut parts = parts_for("/account", Some(session.clone()));
        let RequireAuth(found) = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(found.email, user.email);

        clear_current_user(&session).await.unwrap();
        let mut parts = parts_for("/", Some(session));
        let OptionalAuth(found) = OptionalAuth::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
