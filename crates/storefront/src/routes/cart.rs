//! Cart route handlers.
//!
//! The backend owns the cart. Every page view fetches it fresh; every
//! mutation posts to the backend and then redirects back to `/cart`
//! (post/redirect/get), so nothing is cached between requests.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    response::{IntoResponse, Redirect, Response},
};
use ecomai_core::{Cart, CartItemId, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::auth::login_required;
use super::products::ProductShowTemplate;
use crate::error::{add_breadcrumb, shop_status};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::services::{ShopError, WebShop};

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: CartItemId,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: CartItemId,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub user: Option<CurrentUser>,
    pub cart: Option<Cart>,
    pub error: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

/// Show the cart again with an error banner after a failed mutation.
async fn cart_with_error(
    shop: &WebShop,
    session: &Session,
    user: Option<CurrentUser>,
    err: &ShopError,
) -> Response {
    if err.is_auth() {
        return login_required(shop, session, err).await;
    }

    // Best effort: the banner matters more than the refreshed lines
    let cart = shop.cart().await.ok();
    (
        shop_status(err),
        CartShowTemplate {
            user,
            cart,
            error: Some(err.user_message()),
        },
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart page.
#[instrument(skip_all)]
pub async fn show(session: Session, shop: WebShop, OptionalAuth(user): OptionalAuth) -> Response {
    match shop.cart().await {
        Ok(cart) => CartShowTemplate {
            user,
            cart: Some(cart),
            error: None,
        }
        .into_response(),
        Err(e) if e.is_auth() => login_required(&shop, &session, &e).await,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch cart");
            (
                shop_status(&e),
                CartShowTemplate {
                    user,
                    cart: None,
                    error: Some(e.user_message()),
                },
            )
                .into_response()
        }
    }
}

/// Add a product to the cart.
///
/// On failure the product page is shown again with the backend's message.
#[instrument(skip(session, shop, user))]
pub async fn add(
    session: Session,
    shop: WebShop,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let quantity = form.quantity.unwrap_or(1).max(1);

    match shop.add_to_cart(form.product_id, quantity).await {
        Ok(cart) => {
            let product_id = form.product_id.to_string();
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[("product_id", product_id.as_str())]),
            );
            tracing::debug!(items = cart.item_count(), "Cart updated");
            Redirect::to("/cart").into_response()
        }
        Err(e) if e.is_auth() => login_required(&shop, &session, &e).await,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to add to cart");
            match shop.product(form.product_id).await {
                Ok(product) => (
                    shop_status(&e),
                    ProductShowTemplate {
                        user,
                        product,
                        error: Some(e.user_message()),
                    },
                )
                    .into_response(),
                Err(_) => cart_with_error(&shop, &session, user, &e).await,
            }
        }
    }
}

/// Change the quantity of a cart line. A quantity of zero removes it.
#[instrument(skip(session, shop, user))]
pub async fn update(
    session: Session,
    shop: WebShop,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let result = if form.quantity == 0 {
        shop.remove_cart_item(form.item_id).await
    } else {
        shop.update_cart_item(form.item_id, form.quantity).await
    };

    match result {
        Ok(_) => Redirect::to("/cart").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to update cart item");
            cart_with_error(&shop, &session, user, &e).await
        }
    }
}

/// Remove a cart line.
#[instrument(skip(session, shop, user))]
pub async fn remove(
    session: Session,
    shop: WebShop,
    OptionalAuth(user): OptionalAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    match shop.remove_cart_item(form.item_id).await {
        Ok(_) => Redirect::to("/cart").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to remove cart item");
            cart_with_error(&shop, &session, user, &e).await
        }
    }
}

/// Empty the cart.
#[instrument(skip_all)]
pub async fn clear(session: Session, shop: WebShop, OptionalAuth(user): OptionalAuth) -> Response {
    match shop.clear_cart().await {
        Ok(()) => Redirect::to("/cart").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to clear cart");
            cart_with_error(&shop, &session, user, &e).await
        }
    }
}
