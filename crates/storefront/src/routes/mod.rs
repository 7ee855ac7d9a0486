//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Home page (offers, assistant entry)
//! GET  /health                   - Liveness check
//! GET  /health/ready             - Readiness check (backend reachable)
//!
//! # Products
//! GET  /products                 - Product listing (?category=, ?q=)
//! GET  /products/{id}            - Product detail
//!
//! # Cart (requires token)
//! GET  /cart                     - Cart page
//! POST /cart/add                 - Add product
//! POST /cart/update              - Change line quantity (0 removes)
//! POST /cart/remove              - Remove line
//! POST /cart/clear               - Empty cart
//!
//! # Auth
//! GET  /auth/login               - Login page
//! POST /auth/login               - Password login
//! GET  /auth/register            - Register page
//! POST /auth/register            - Create account
//! GET  /auth/face-login          - Face login page
//! POST /auth/face-login          - Face login (multipart: email, image)
//! POST /auth/logout              - Logout
//!
//! # Account (requires auth)
//! GET  /account                  - Account overview
//! GET  /account/face             - Face registration page
//! POST /account/face             - Register face (multipart: image)
//!
//! # Admin (requires auth; backend enforces the role)
//! GET  /admin/products           - Product management
//! POST /admin/products           - Create product
//! POST /admin/products/{id}/delete - Delete product
//!
//! # Assistant
//! GET  /chat                     - Conversation page
//! POST /chat                     - Send a message
//!
//! # JSON API (capture widget, assistant widget)
//! POST /api/auth/face-login      - {email, imageBase64}
//! POST /api/account/face         - {imageBase64}
//! POST /api/chat                 - {message, context}
//! ```

pub mod account;
pub mod admin;
pub mod api;
pub mod auth;
pub mod cart;
pub mod chat;
pub mod health;
pub mod home;
pub mod products;
pub mod upload;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{create_session_layer, request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/face-login", get(auth::face_login_page).post(auth::face_login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/face", get(account::face_page).post(account::register_face))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(admin::index).post(admin::create))
        .route("/products/{id}/delete", post(admin::delete))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/face-login", post(api::face::login))
        .route("/account/face", post(api::face::register))
        .route("/chat", post(api::chat::send))
}

/// Create all page and API routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .nest("/admin", admin_routes())
        .route("/chat", get(chat::page).post(chat::send))
        .nest("/api", api_routes())
}

/// Build the complete application: routes, health checks and middleware.
///
/// Sentry layers are added by the binary so tests can run without a client.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(routes())
        // Face stills arrive as multipart files or base64 JSON
        .layer(DefaultBodyLimit::max(upload::MAX_BODY_BYTES))
        .layer(session_layer)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
