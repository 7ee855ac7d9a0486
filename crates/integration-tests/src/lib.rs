//! Integration tests for Ecomai.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ecomai-integration-tests
//! ```
//!
//! No external services are needed: the commerce backend and the assistant
//! are `wiremock` servers started per test.
//!
//! # Test Categories
//!
//! - `shop_flow` - Token handling across shop operations
//! - `storefront_routes` - The full router, driven with `oneshot`
//! - `face_capture` - Capture controller output fed into face login

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use axum::{
    Router,
    body::Body,
    http::{Response, header},
};
use ecomai_storefront::backend::BackendClient;
use ecomai_storefront::config::StorefrontConfig;
use ecomai_storefront::routes;
use ecomai_storefront::services::{MemoryTokenStore, ShopService};
use ecomai_storefront::state::AppState;
use serde_json::{Value, json};
use wiremock::MockServer;

/// Smallest byte sequence the file camera accepts as a JPEG frame.
pub const JPEG_FRAME: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

/// Mocked remote services.
pub struct TestEnv {
    pub backend: MockServer,
    pub assistant: MockServer,
}

impl TestEnv {
    /// Start both mock servers.
    pub async fn start() -> Self {
        Self {
            backend: MockServer::start().await,
            assistant: MockServer::start().await,
        }
    }

    /// Storefront configuration pointing at the mocks.
    pub fn config(&self) -> StorefrontConfig {
        let backend = self.backend.uri();
        let assistant = self.assistant.uri();
        StorefrontConfig::from_lookup(|key| match key {
            "STOREFRONT_BASE_URL" => Some("http://localhost:3000".to_string()),
            "BACKEND_API_URL" => Some(backend.clone()),
            "AI_SERVICE_URL" => Some(assistant.clone()),
            "BACKEND_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        })
        .expect("test configuration is valid")
    }

    /// A shop service with an empty in-memory token store.
    pub fn shop(&self) -> ShopService<MemoryTokenStore> {
        let backend = BackendClient::new(&self.config().backend).expect("client builds");
        ShopService::new(backend, MemoryTokenStore::new())
    }

    /// The complete storefront router.
    pub fn app(&self) -> Router {
        routes::app(AppState::new(self.config()).expect("state builds"))
    }
}

/// A product record as the backend sends it.
pub fn product_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "A test product",
        "price": 49.99,
        "discountPrice": null,
        "imageUrl": null,
        "category": "Electronics",
        "stock": 5
    })
}

/// A cart holding two units of one product.
pub fn cart_json(product_id: i64, product_name: &str) -> Value {
    json!({
        "id": 7,
        "items": [{
            "id": 11,
            "productId": product_id,
            "productName": product_name,
            "productPrice": 49.99,
            "productImageUrl": null,
            "quantity": 2,
            "subtotal": 99.98
        }],
        "totalPrice": 99.98
    })
}

/// The `name=value` pair of the session cookie set by a response.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .find(|pair| pair.starts_with("ecomai_session="))
        .map(str::to_string)
}

/// Collect a response body as text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body is readable");
    String::from_utf8_lossy(&bytes).into_owned()
}
