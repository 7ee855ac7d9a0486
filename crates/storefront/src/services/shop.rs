//! Shop operations bound to a token store.
//!
//! [`ShopService`] pairs the stateless [`BackendClient`] with the token of one
//! session. Login-type operations save the returned token; every operation
//! that needs a token reads it first and fails with
//! [`BackendError::MissingToken`] before any network I/O when none is stored.

use axum::{extract::FromRequestParts, http::request::Parts};
use ecomai_core::{Cart, CartItemId, Email, ImageDataUrl, NewProduct, Product, ProductId};
use secrecy::SecretString;
use thiserror::Error;
use tower_sessions::Session;
use tracing::{debug, instrument};

use super::token_store::{SessionTokenStore, TokenStore, TokenStoreError};
use crate::backend::{BackendClient, BackendError};
use crate::error::AppError;
use crate::state::AppState;

/// Errors from shop operations.
#[derive(Debug, Error)]
pub enum ShopError {
    /// The backend call failed, or no token was stored.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The token store failed.
    #[error(transparent)]
    Store(#[from] TokenStoreError),
}

impl ShopError {
    /// Whether the shopper has to log in (again).
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        match self {
            Self::Backend(err) => err.is_auth(),
            Self::Store(_) => false,
        }
    }

    /// Text suitable for showing to a shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(err) => err.user_message(),
            Self::Store(_) => "Your session could not be read. Please try again.".to_string(),
        }
    }
}

/// Backend operations for one session.
pub struct ShopService<S> {
    backend: BackendClient,
    tokens: S,
}

/// The shop service of the current browser session.
pub type WebShop = ShopService<SessionTokenStore>;

impl<S: TokenStore> ShopService<S> {
    /// Bind a backend client to a token store.
    #[must_use]
    pub const fn new(backend: BackendClient, tokens: S) -> Self {
        Self { backend, tokens }
    }

    /// The token store this service reads from.
    #[must_use]
    pub const fn tokens(&self) -> &S {
        &self.tokens
    }

    /// Whether a token is stored.
    ///
    /// # Errors
    ///
    /// Returns error if the token store cannot be read.
    pub async fn is_authenticated(&self) -> Result<bool, ShopError> {
        Ok(self.tokens.is_present().await?)
    }

    async fn require_token(&self) -> Result<SecretString, ShopError> {
        self.tokens.read().await?.ok_or_else(|| {
            debug!("No token stored, skipping request");
            ShopError::Backend(BackendError::MissingToken)
        })
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Create an account and keep its token.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the registration. Nothing is
    /// stored in that case.
    #[instrument(skip(self, full_name, password), fields(email = %email))]
    pub async fn register(
        &self,
        full_name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<(), ShopError> {
        let token = self.backend.register(full_name, email, password).await?;
        self.tokens.save(token).await?;
        Ok(())
    }

    /// Log in with a password and keep the token.
    ///
    /// # Errors
    ///
    /// Returns error if the credentials are rejected. Nothing is stored in
    /// that case.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<(), ShopError> {
        let token = self.backend.login(email, password).await?;
        self.tokens.save(token).await?;
        Ok(())
    }

    /// Log in with a captured face image and keep the token.
    ///
    /// # Errors
    ///
    /// Returns error if the face is not recognized.
    #[instrument(skip(self, image), fields(email = %email))]
    pub async fn biometric_login(&self, email: &Email, image: &ImageDataUrl) -> Result<(), ShopError> {
        let token = self.backend.biometric_login(email, image).await?;
        self.tokens.save(token).await?;
        Ok(())
    }

    /// Forget the token.
    ///
    /// # Errors
    ///
    /// Returns error if the token store cannot be written.
    pub async fn logout(&self) -> Result<(), ShopError> {
        self.tokens.clear().await?;
        Ok(())
    }

    /// Register a reference face image for the logged-in account.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::MissingToken`] without a request when logged out.
    #[instrument(skip_all)]
    pub async fn register_face(&self, image: &ImageDataUrl) -> Result<(), ShopError> {
        let token = self.require_token().await?;
        Ok(self.backend.register_face(&token, image).await?)
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn products(&self) -> Result<Vec<Product>, ShopError> {
        Ok(self.backend.list_products().await?)
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn offers(&self) -> Result<Vec<Product>, ShopError> {
        Ok(self.backend.offers().await?)
    }

    /// # Errors
    ///
    /// Returns error if the request fails or the product does not exist.
    pub async fn product(&self, id: ProductId) -> Result<Product, ShopError> {
        Ok(self.backend.product(id).await?)
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, ShopError> {
        Ok(self.backend.products_by_category(category).await?)
    }

    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn search(&self, query: &str) -> Result<Vec<Product>, ShopError> {
        Ok(self.backend.search_products(query).await?)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the cart.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::MissingToken`] without a request when logged out.
    pub async fn cart(&self) -> Result<Cart, ShopError> {
        let token = self.require_token().await?;
        Ok(self.backend.cart(&token).await?)
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::MissingToken`] without a request when logged out.
    pub async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> Result<Cart, ShopError> {
        let token = self.require_token().await?;
        Ok(self.backend.add_to_cart(&token, product_id, quantity).await?)
    }

    /// Change the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::MissingToken`] without a request when logged out.
    pub async fn update_cart_item(&self, item_id: CartItemId, quantity: u32) -> Result<Cart, ShopError> {
        let token = self.require_token().await?;
        Ok(self.backend.update_cart_item(&token, item_id, quantity).await?)
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::MissingToken`] without a request when logged out.
    pub async fn remove_cart_item(&self, item_id: CartItemId) -> Result<Cart, ShopError> {
        let token = self.require_token().await?;
        Ok(self.backend.remove_cart_item(&token, item_id).await?)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::MissingToken`] without a request when logged out.
    pub async fn clear_cart(&self) -> Result<(), ShopError> {
        let token = self.require_token().await?;
        Ok(self.backend.clear_cart(&token).await?)
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::MissingToken`] without a request when logged out.
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, ShopError> {
        let token = self.require_token().await?;
        Ok(self.backend.create_product(&token, product).await?)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::MissingToken`] without a request when logged out.
    pub async fn delete_product(&self, id: ProductId) -> Result<(), ShopError> {
        let token = self.require_token().await?;
        Ok(self.backend.delete_product(&token, id).await?)
    }
}

// =============================================================================
// Extractor
// =============================================================================

impl FromRequestParts<AppState> for WebShop {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Session is inserted by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        Ok(Self::new(
            state.backend().clone(),
            SessionTokenStore::new(session),
        ))
    }
}
