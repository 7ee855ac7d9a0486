//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use ecomai_core::Product;
use tracing::instrument;

use crate::backend::CHAT_GREETING;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::state::AppState;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub user: Option<CurrentUser>,
    pub offers: Vec<Product>,
    pub error: Option<String>,
    pub greeting: &'static str,
}

/// Display the home page with current offers.
///
/// A failing offers call still renders the page, with a notice instead of
/// the product grid.
#[instrument(skip_all)]
pub async fn home(State(state): State<AppState>, OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    let (offers, error) = match state.backend().offers().await {
        Ok(offers) => (offers, None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch offers");
            (Vec::new(), Some(e.user_message()))
        }
    };

    HomeTemplate {
        user,
        offers,
        error,
        greeting: CHAT_GREETING,
    }
}
