//! Product administration route handlers.
//!
//! The storefront only checks that someone is logged in; whether that
//! account may create or delete products is the backend's decision, and its
//! refusal message is shown as-is.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use ecomai_core::{NewProduct, Price, Product, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::auth::{MessageQuery, login_required};
use crate::error::shop_status;
use crate::filters;
use crate::middleware::auth::RequireAuth;
use crate::models::CurrentUser;
use crate::services::{ShopError, WebShop};

// =============================================================================
// Form Types
// =============================================================================

/// Create product form data. Numeric fields arrive as text.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    #[serde(default)]
    pub discount_price: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub stock: String,
}

impl ProductForm {
    /// Turn the form into a backend request.
    ///
    /// # Errors
    ///
    /// Returns the message to show next to the form.
    pub fn to_new_product(&self) -> Result<NewProduct, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Product name is required".to_string());
        }

        let price: Price = self
            .price
            .parse()
            .map_err(|e| format!("Price: {e}"))?;
        let discount_price = match self.discount_price.trim() {
            "" => None,
            raw => Some(raw.parse::<Price>().map_err(|e| format!("Discount price: {e}"))?),
        };
        let stock = match self.stock.trim() {
            "" => 0,
            raw => raw
                .parse::<i32>()
                .ok()
                .filter(|stock| *stock >= 0)
                .ok_or_else(|| "Stock must be a whole number, 0 or more".to_string())?,
        };

        Ok(NewProduct {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            price,
            discount_price,
            image_url: self.image_url.trim().to_string(),
            category: self.category.trim().to_string(),
            stock,
        })
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product management page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct AdminProductsTemplate {
    pub user: Option<CurrentUser>,
    pub products: Vec<Product>,
    pub form: ProductForm,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Render the management page with the current product list.
async fn products_page(
    shop: &WebShop,
    user: CurrentUser,
    form: ProductForm,
    status: StatusCode,
    error: Option<String>,
    success: Option<String>,
) -> Response {
    let (products, error) = match shop.products().await {
        Ok(products) => (products, error),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch products");
            (Vec::new(), error.or_else(|| Some(e.user_message())))
        }
    };

    (
        status,
        AdminProductsTemplate {
            user: Some(user),
            products,
            form,
            error,
            success,
        },
    )
        .into_response()
}

async fn failed(
    shop: &WebShop,
    session: &Session,
    user: CurrentUser,
    form: ProductForm,
    err: &ShopError,
) -> Response {
    if matches!(err, ShopError::Backend(crate::backend::BackendError::MissingToken)) {
        return login_required(shop, session, err).await;
    }
    // 401/403 here usually means "not an admin"; keep the shopper logged in
    products_page(shop, user, form, shop_status(err), Some(err.user_message()), None).await
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the product management page.
#[instrument(skip_all)]
pub async fn index(
    RequireAuth(user): RequireAuth,
    shop: WebShop,
    Query(query): Query<MessageQuery>,
) -> Response {
    products_page(
        &shop,
        user,
        ProductForm::default(),
        StatusCode::OK,
        query.error_text(),
        query.success_text(),
    )
    .await
}

/// Create a product.
#[instrument(skip_all, fields(name = %form.name))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    session: Session,
    shop: WebShop,
    Form(form): Form<ProductForm>,
) -> Response {
    let new_product = match form.to_new_product() {
        Ok(new_product) => new_product,
        Err(message) => {
            return products_page(&shop, user, form, StatusCode::BAD_REQUEST, Some(message), None)
                .await;
        }
    };

    match shop.create_product(&new_product).await {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product created");
            Redirect::to("/admin/products?success=product_created").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to create product");
            failed(&shop, &session, user, form, &e).await
        }
    }
}

/// Delete a product.
#[instrument(skip(user, session, shop))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    session: Session,
    shop: WebShop,
    Path(id): Path<ProductId>,
) -> Response {
    match shop.delete_product(id).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product deleted");
            Redirect::to("/admin/products?success=product_deleted").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to delete product");
            failed(&shop, &session, user, ProductForm::default(), &e).await
        }
    }
}
