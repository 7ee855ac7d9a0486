//! Integration tests for the storefront router.
//!
//! Requests go through the whole middleware stack with `oneshot`; the
//! session cookie is carried by hand between requests.

#![allow(clippy::unwrap_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use ecomai_core::ImageDataUrl;
use ecomai_integration_tests::{JPEG_FRAME, TestEnv, body_text, cart_json, product_json, session_cookie};
use ecomai_storefront::routes::upload::MAX_IMAGE_BYTES;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{
    any, body_json, body_partial_json, header as header_matcher, method, path,
};
use wiremock::{Mock, ResponseTemplate};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post_form(uri: &str, cookie: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const BOUNDARY: &str = "ecomai-test-boundary";

/// A `multipart/form-data` face upload with an optional email field.
fn post_face_upload(
    uri: &str,
    cookie: Option<&str>,
    email: Option<&str>,
    mime_type: &str,
    image: &[u8],
) -> Request<Body> {
    let mut body = Vec::new();
    if let Some(email) = email {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"email\"\r\n\r\n{email}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"face\"\r\nContent-Type: {mime_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(image);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    request.body(Body::from(body)).unwrap()
}

/// Log in through the JSON face login and return the session cookie.
async fn face_login(env: &TestEnv, app: &Router) -> String {
    Mock::given(method("POST"))
        .and(path("/api/auth/biometric-login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "face-token" })))
        .mount(&env.backend)
        .await;

    let image = ImageDataUrl::encode("image/jpeg", JPEG_FRAME);
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/auth/face-login",
            &json!({ "email": "ana@example.com", "imageBase64": image.as_str() }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response).unwrap()
}

fn location(response: &axum::http::Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

// =============================================================================
// Health and headers
// =============================================================================

#[tokio::test]
async fn test_health_carries_security_headers() {
    let env = TestEnv::start().await;

    let response = env.app().oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    let permissions = headers.get("permissions-policy").unwrap().to_str().unwrap();
    assert!(permissions.contains("camera=(self)"));
    assert!(permissions.contains("microphone=()"));
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_follows_backend() {
    let env = TestEnv::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/offers"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&env.backend)
        .await;

    let response = env.app().oneshot(get("/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// =============================================================================
// Pages
// =============================================================================

#[tokio::test]
async fn test_cart_page_logged_out_redirects_without_backend_call() {
    let env = TestEnv::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&env.backend)
        .await;

    let response = env.app().oneshot(get("/cart")).await.unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/auth/login?error=login_required");
}

#[tokio::test]
async fn test_account_page_requires_login() {
    let env = TestEnv::start().await;

    let response = env.app().oneshot(get("/account")).await.unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_product_page_renders_backend_product() {
    let env = TestEnv::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_json(3, "Headphones")))
        .mount(&env.backend)
        .await;

    let response = env.app().oneshot(get("/products/3")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Headphones"));
}

#[tokio::test]
async fn test_product_page_encodes_category_link() {
    let env = TestEnv::start().await;
    let mut product = product_json(4, "Desk lamp");
    product["category"] = json!("Home & Garden");
    Mock::given(method("GET"))
        .and(path("/api/products/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(product))
        .mount(&env.backend)
        .await;

    let response = env.app().oneshot(get("/products/4")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        body_text(response)
            .await
            .contains(r#"href="/products?category=Home%20%26%20Garden""#)
    );
}

#[tokio::test]
async fn test_rejected_token_expires_session_then_fails_fast() {
    let env = TestEnv::start().await;
    let app = env.app();
    let cookie = face_login(&env, &app).await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Token expired"
        })))
        .expect(1)
        .mount(&env.backend)
        .await;

    let expired = app
        .clone()
        .oneshot(get_with_cookie("/cart", &cookie))
        .await
        .unwrap();
    assert!(expired.status().is_redirection());
    assert_eq!(location(&expired), "/auth/login?error=session_expired");
    let cookie = session_cookie(&expired).unwrap_or(cookie);

    // The dropped token is not sent again
    let again = app
        .clone()
        .oneshot(get_with_cookie("/cart", &cookie))
        .await
        .unwrap();
    assert!(again.status().is_redirection());
    assert_eq!(location(&again), "/auth/login?error=login_required");

    let account = app
        .oneshot(get_with_cookie("/account", &cookie))
        .await
        .unwrap();
    assert_eq!(location(&account), "/auth/login");
}

// =============================================================================
// Multipart face forms
// =============================================================================

#[tokio::test]
async fn test_face_login_form_starts_session() {
    let env = TestEnv::start().await;
    let image = ImageDataUrl::encode("image/jpeg", JPEG_FRAME);
    Mock::given(method("POST"))
        .and(path("/api/auth/biometric-login"))
        .and(body_json(json!({
            "email": "ana@example.com",
            "imageBase64": image.as_str()
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "face-token" })))
        .expect(1)
        .mount(&env.backend)
        .await;

    let app = env.app();
    let response = app
        .clone()
        .oneshot(post_face_upload(
            "/auth/face-login",
            None,
            Some("ana@example.com"),
            "image/jpeg",
            JPEG_FRAME,
        ))
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/account");
    let cookie = session_cookie(&response).unwrap();

    let account = app
        .oneshot(get_with_cookie("/account", &cookie))
        .await
        .unwrap();
    assert_eq!(account.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_face_login_form_shows_rejection() {
    let env = TestEnv::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/biometric-login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "Face not recognized"
        })))
        .mount(&env.backend)
        .await;

    let response = env
        .app()
        .oneshot(post_face_upload(
            "/auth/face-login",
            None,
            Some("ana@example.com"),
            "image/jpeg",
            JPEG_FRAME,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.contains("Face not recognized"));
}

#[tokio::test]
async fn test_face_login_form_rejects_bad_uploads() {
    let env = TestEnv::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&env.backend)
        .await;
    let app = env.app();

    let gif = app
        .clone()
        .oneshot(post_face_upload(
            "/auth/face-login",
            None,
            Some("ana@example.com"),
            "image/gif",
            b"GIF89a",
        ))
        .await
        .unwrap();
    assert_eq!(gif.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(gif).await.contains("Invalid photo"));

    let mut oversized = JPEG_FRAME.to_vec();
    oversized.resize(MAX_IMAGE_BYTES + 1, 0);
    let large = app
        .oneshot(post_face_upload(
            "/auth/face-login",
            None,
            Some("ana@example.com"),
            "image/jpeg",
            &oversized,
        ))
        .await
        .unwrap();
    assert_eq!(large.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(large).await.contains("The photo is too large"));
}

#[tokio::test]
async fn test_face_registration_form_uses_session_token() {
    let env = TestEnv::start().await;
    let app = env.app();
    let cookie = face_login(&env, &app).await;
    let image = ImageDataUrl::encode("image/png", b"\x89PNG\r\n");
    Mock::given(method("POST"))
        .and(path("/api/auth/register-face"))
        .and(header_matcher("authorization", "Bearer face-token"))
        .and(body_json(json!({ "imageBase64": image.as_str() })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&env.backend)
        .await;

    let response = app
        .oneshot(post_face_upload(
            "/account/face",
            Some(&cookie),
            None,
            "image/png",
            b"\x89PNG\r\n",
        ))
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/account?success=face_registered");
}

// =============================================================================
// Admin
// =============================================================================

#[tokio::test]
async fn test_admin_creates_and_deletes_products() {
    let env = TestEnv::start().await;
    let app = env.app();
    let cookie = face_login(&env, &app).await;
    Mock::given(method("POST"))
        .and(path("/api/products"))
        .and(header_matcher("authorization", "Bearer face-token"))
        .and(body_partial_json(json!({
            "name": "Desk lamp",
            "category": "Home & Garden",
            "stock": 4
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(product_json(9, "Desk lamp")))
        .expect(1)
        .mount(&env.backend)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/products/9"))
        .and(header_matcher("authorization", "Bearer face-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&env.backend)
        .await;

    let created = app
        .clone()
        .oneshot(post_form(
            "/admin/products",
            &cookie,
            "name=Desk+lamp&price=25.00&category=Home+%26+Garden&stock=4",
        ))
        .await
        .unwrap();
    assert!(created.status().is_redirection());
    assert_eq!(location(&created), "/admin/products?success=product_created");

    let deleted = app
        .oneshot(post_form("/admin/products/9/delete", &cookie, ""))
        .await
        .unwrap();
    assert!(deleted.status().is_redirection());
    assert_eq!(location(&deleted), "/admin/products?success=product_deleted");
}

#[tokio::test]
async fn test_admin_refusal_keeps_shopper_logged_in() {
    let env = TestEnv::start().await;
    let app = env.app();
    let cookie = face_login(&env, &app).await;
    Mock::given(method("POST"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "Admin role required"
        })))
        .expect(1)
        .mount(&env.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&env.backend)
        .await;

    let refused = app
        .clone()
        .oneshot(post_form(
            "/admin/products",
            &cookie,
            "name=Desk+lamp&price=25.00&stock=4",
        ))
        .await
        .unwrap();
    assert_eq!(refused.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(refused).await.contains("Admin role required"));

    let account = app
        .oneshot(get_with_cookie("/account", &cookie))
        .await
        .unwrap();
    assert_eq!(account.status(), StatusCode::OK);
}

// =============================================================================
// JSON API
// =============================================================================

#[tokio::test]
async fn test_face_registration_api_without_token_is_401() {
    let env = TestEnv::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&env.backend)
        .await;
    let image = ImageDataUrl::encode("image/jpeg", JPEG_FRAME);

    let response = env
        .app()
        .oneshot(post_json(
            "/api/account/face",
            &json!({ "imageBase64": image.as_str() }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "Please log in to continue.");
}

#[tokio::test]
async fn test_face_login_api_rejects_missing_photo() {
    let env = TestEnv::start().await;

    let response = env
        .app()
        .oneshot(post_json(
            "/api/auth/face-login",
            &json!({ "email": "ana@example.com", "imageBase64": "" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["error"], "Please take a photo first");
}

#[tokio::test]
async fn test_face_login_session_is_used_for_cart() {
    let env = TestEnv::start().await;
    let image = ImageDataUrl::encode("image/jpeg", JPEG_FRAME);
    Mock::given(method("POST"))
        .and(path("/api/auth/biometric-login"))
        .and(body_json(json!({
            "email": "ana@example.com",
            "imageBase64": image.as_str()
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "face-token" })))
        .expect(1)
        .mount(&env.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .and(header_matcher("authorization", "Bearer face-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_json(3, "Headphones")))
        .expect(1)
        .mount(&env.backend)
        .await;

    let app = env.app();
    let login = app
        .clone()
        .oneshot(post_json(
            "/api/auth/face-login",
            &json!({ "email": "ana@example.com", "imageBase64": image.as_str() }),
        ))
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);
    let cookie = session_cookie(&login).unwrap();
    let body: Value = serde_json::from_str(&body_text(login).await).unwrap();
    assert_eq!(body["redirect"], "/account");

    let cart_request = Request::builder()
        .uri("/cart")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let cart = app.oneshot(cart_request).await.unwrap();

    assert_eq!(cart.status(), StatusCode::OK);
    assert!(body_text(cart).await.contains("Headphones"));
}

#[tokio::test]
async fn test_chat_api_answers_with_apology_when_assistant_fails() {
    let env = TestEnv::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/generate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&env.assistant)
        .await;

    let response = env
        .app()
        .oneshot(post_json(
            "/api/chat",
            &json!({ "message": "Any offers?", "context": "home page" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["response"], ecomai_storefront::backend::CHAT_APOLOGY);
}
