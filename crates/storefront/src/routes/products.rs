//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use ecomai_core::{Product, ProductId};
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::state::AppState;

// =============================================================================
// Query Types
// =============================================================================

/// Listing filters. `q` wins over `category` when both are given.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

impl ProductQuery {
    fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub user: Option<CurrentUser>,
    pub products: Vec<Product>,
    pub heading: String,
    pub query: String,
    pub category: String,
    pub error: Option<String>,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub user: Option<CurrentUser>,
    pub product: Product,
    pub error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the product listing, optionally searched or filtered by category.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<ProductQuery>,
) -> impl IntoResponse {
    let backend = state.backend();
    let (heading, result) = match (query.search(), query.category()) {
        (Some(q), _) => (format!("Results for \"{q}\""), backend.search_products(q).await),
        (None, Some(category)) => (
            category.to_string(),
            backend.products_by_category(category).await,
        ),
        (None, None) => ("All products".to_string(), backend.list_products().await),
    };

    let (products, error) = match result {
        Ok(products) => (products, None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch products");
            (Vec::new(), Some(e.user_message()))
        }
    };

    ProductsIndexTemplate {
        user,
        products,
        heading,
        query: query.search().unwrap_or_default().to_string(),
        category: query.category().unwrap_or_default().to_string(),
        error,
    }
}

/// Display a product.
///
/// # Errors
///
/// Returns 404 when the backend does not know the product.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<ProductId>,
) -> Result<Response, AppError> {
    let product = state.backend().product(id).await?;

    Ok(ProductShowTemplate {
        user,
        product,
        error: None,
    }
    .into_response())
}
