//! Commerce backend client.

use std::sync::Arc;
use std::time::Duration;

use ecomai_core::{Cart, CartItemId, Email, ImageDataUrl, NewProduct, Product, ProductId};
use reqwest::{RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::types::{
    AuthResponse, BiometricLoginRequest, LoginRequest, RegisterFaceRequest, RegisterRequest,
};
use super::{BackendError, Operation, error_message};
use crate::config::BackendConfig;

/// Client for the commerce backend REST API.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::with_base_url(config.api_url.clone(), config.timeout)
    }

    /// Create a client for an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn with_base_url(base_url: Url, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ecomai-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner { client, base_url }),
        })
    }

    /// The backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Create an account and return its token.
    ///
    /// # Errors
    ///
    /// Returns the server's message on rejection (e.g. "Email already exists").
    #[instrument(skip(self, full_name, password), fields(email = %email))]
    pub async fn register(
        &self,
        full_name: &str,
        email: &Email,
        password: &SecretString,
    ) -> Result<SecretString, BackendError> {
        let body = RegisterRequest {
            full_name,
            email,
            password: password.expose_secret(),
        };
        let request = self
            .inner
            .client
            .post(self.endpoint(&["api", "auth", "register"]))
            .json(&body);

        let response: AuthResponse = send(request, Operation::Register).await?;
        Ok(SecretString::from(response.token))
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unauthorized`] with the server's message on bad credentials.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<SecretString, BackendError> {
        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let request = self
            .inner
            .client
            .post(self.endpoint(&["api", "auth", "login"]))
            .json(&body);

        let response: AuthResponse = send(request, Operation::Login).await?;
        Ok(SecretString::from(response.token))
    }

    /// Log in with a captured face image.
    ///
    /// # Errors
    ///
    /// Returns the server's message when the face is not recognized.
    #[instrument(skip(self, image), fields(email = %email))]
    pub async fn biometric_login(
        &self,
        email: &Email,
        image: &ImageDataUrl,
    ) -> Result<SecretString, BackendError> {
        let body = BiometricLoginRequest {
            email,
            image_base64: image,
        };
        let request = self
            .inner
            .client
            .post(self.endpoint(&["api", "auth", "biometric-login"]))
            .json(&body);

        let response: AuthResponse = send(request, Operation::BiometricLogin).await?;
        Ok(SecretString::from(response.token))
    }

    /// Store a reference face image for the authenticated account.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the server rejects it.
    #[instrument(skip_all)]
    pub async fn register_face(
        &self,
        token: &SecretString,
        image: &ImageDataUrl,
    ) -> Result<(), BackendError> {
        let request = self
            .inner
            .client
            .post(self.endpoint(&["api", "auth", "register-face"]))
            .bearer_auth(token.expose_secret())
            .json(&RegisterFaceRequest {
                image_base64: image,
            });

        send_empty(request, Operation::RegisterFace).await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List all products.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        let request = self.inner.client.get(self.endpoint(&["api", "products"]));
        send(request, Operation::ListProducts).await
    }

    /// List products currently on offer.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn offers(&self) -> Result<Vec<Product>, BackendError> {
        let request = self
            .inner
            .client
            .get(self.endpoint(&["api", "products", "offers"]));
        send(request, Operation::Offers).await
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Api`] with status 404 if it does not exist.
    #[instrument(skip(self))]
    pub async fn product(&self, id: ProductId) -> Result<Product, BackendError> {
        let id = id.to_string();
        let request = self
            .inner
            .client
            .get(self.endpoint(&["api", "products", &id]));
        send(request, Operation::Product).await
    }

    /// List products in a category.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, BackendError> {
        let request = self
            .inner
            .client
            .get(self.endpoint(&["api", "products", "category", category]));
        send(request, Operation::ProductsByCategory).await
    }

    /// Full-text product search.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, BackendError> {
        let mut url = self.endpoint(&["api", "products", "search"]);
        url.query_pairs_mut().append_pair("query", query);

        send(self.inner.client.get(url), Operation::SearchProducts).await
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Fetch the shopper's cart.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip_all)]
    pub async fn cart(&self, token: &SecretString) -> Result<Cart, BackendError> {
        let request = self
            .inner
            .client
            .get(self.endpoint(&["api", "cart"]))
            .bearer_auth(token.expose_secret());
        send(request, Operation::GetCart).await
    }

    /// Add a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn add_to_cart(
        &self,
        token: &SecretString,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, BackendError> {
        let mut url = self.endpoint(&["api", "cart", "items"]);
        url.query_pairs_mut()
            .append_pair("productId", &product_id.to_string())
            .append_pair("quantity", &quantity.to_string());

        let request = self
            .inner
            .client
            .post(url)
            .bearer_auth(token.expose_secret());
        send(request, Operation::AddToCart).await
    }

    /// Change the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn update_cart_item(
        &self,
        token: &SecretString,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<Cart, BackendError> {
        let id = item_id.to_string();
        let mut url = self.endpoint(&["api", "cart", "items", &id]);
        url.query_pairs_mut()
            .append_pair("quantity", &quantity.to_string());

        let request = self
            .inner
            .client
            .put(url)
            .bearer_auth(token.expose_secret());
        send(request, Operation::UpdateCartItem).await
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn remove_cart_item(
        &self,
        token: &SecretString,
        item_id: CartItemId,
    ) -> Result<Cart, BackendError> {
        let id = item_id.to_string();
        let request = self
            .inner
            .client
            .delete(self.endpoint(&["api", "cart", "items", &id]))
            .bearer_auth(token.expose_secret());
        send(request, Operation::RemoveCartItem).await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip_all)]
    pub async fn clear_cart(&self, token: &SecretString) -> Result<(), BackendError> {
        let request = self
            .inner
            .client
            .delete(self.endpoint(&["api", "cart"]))
            .bearer_auth(token.expose_secret());
        send_empty(request, Operation::ClearCart).await
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the server rejects the product.
    #[instrument(skip(self, token, product), fields(name = %product.name))]
    pub async fn create_product(
        &self,
        token: &SecretString,
        product: &NewProduct,
    ) -> Result<Product, BackendError> {
        let request = self
            .inner
            .client
            .post(self.endpoint(&["api", "products"]))
            .bearer_auth(token.expose_secret())
            .json(product);
        send(request, Operation::CreateProduct).await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn delete_product(
        &self,
        token: &SecretString,
        id: ProductId,
    ) -> Result<(), BackendError> {
        let id = id.to_string();
        let request = self
            .inner
            .client
            .delete(self.endpoint(&["api", "products", &id]))
            .bearer_auth(token.expose_secret());
        send_empty(request, Operation::DeleteProduct).await
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Whether the backend answers at all (any non-5xx response).
    pub async fn is_reachable(&self) -> bool {
        self.inner
            .client
            .get(self.endpoint(&["api", "products", "offers"]))
            .send()
            .await
            .is_ok_and(|response| !response.status().is_server_error())
    }

    /// Build an endpoint URL below the base URL. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Send a request and decode a JSON success body.
async fn send<T: DeserializeOwned>(
    request: RequestBuilder,
    operation: Operation,
) -> Result<T, BackendError> {
    let response = execute(request, operation).await?;
    let body = response.text().await?;

    serde_json::from_str(&body).map_err(|e| {
        warn!(
            ?operation,
            error = %e,
            body = %body.chars().take(200).collect::<String>(),
            "Failed to parse backend response"
        );
        BackendError::Parse(e.to_string())
    })
}

/// Send a request whose success body is ignored.
async fn send_empty(request: RequestBuilder, operation: Operation) -> Result<(), BackendError> {
    execute(request, operation).await.map(drop)
}

/// Send a request and turn non-2xx responses into classified errors.
async fn execute(request: RequestBuilder, operation: Operation) -> Result<Response, BackendError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body, operation);
    debug!(
        ?operation,
        status = status.as_u16(),
        message = %message,
        "Backend returned an error"
    );
    Err(BackendError::from_status(status.as_u16(), message))
}
