#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use quoteflow_api::auth::jwt::{generate_access_token, JwtConfig};
use quoteflow_api::auth::password::hash_password;
use quoteflow_api::config::{AccessCodeConfig, ServerConfig, SessionConfig};
use quoteflow_api::router::build_app_router;
use quoteflow_api::state::AppState;
use quoteflow_db::models::user::{CreateUser, User};
use quoteflow_db::repositories::UserRepo;
use quoteflow_events::Mailer;

pub const TEST_PASSWORD: &str = "correct horse battery staple";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin, a 3-attempt access-code
/// limit so rate limiting is quick to trigger, and a webhook secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-jwt-secret".to_string(),
            access_token_expiry_mins: 60,
        },
        session: SessionConfig {
            secret: "test-session-secret".to_string(),
            ttl_hours: 12,
            cookie_name: "qf_session".to_string(),
        },
        access_code: AccessCodeConfig {
            rate_limit_max: 3,
            rate_limit_window_secs: 60,
            expiry_days: 30,
        },
        payment_webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        client_portal_url: "http://localhost:5173/portal".to_string(),
        trusted_proxies: Vec::new(),
    }
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config(), None)
}

/// Like [`build_test_app`] with an explicit config and mailer.
pub fn build_test_app_with(
    pool: PgPool,
    config: ServerConfig,
    mailer: Option<Arc<dyn Mailer>>,
) -> Router {
    let state = AppState::new(pool, config.clone(), mailer).unwrap();
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`].
pub async fn create_user(pool: &PgPool, email: &str, role: &str) -> User {
    let input = CreateUser {
        email: email.to_string(),
        display_name: "Test User".to_string(),
        password_hash: hash_password(TEST_PASSWORD).unwrap(),
        role: Some(role.to_string()),
    };
    UserRepo::create(pool, &input).await.unwrap()
}

/// Insert an admin and return a Bearer token for them.
pub async fn admin_token(pool: &PgPool) -> String {
    let user = create_user(pool, "admin@example.com", "admin").await;
    generate_access_token(user.id, &user.role, &test_config().jwt).unwrap()
}

/// Insert a staff user and return a Bearer token for them.
pub async fn staff_token(pool: &PgPool) -> String {
    let user = create_user(pool, "staff@example.com", "staff").await;
    generate_access_token(user.id, &user.role, &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Send a request with optional bearer token, cookie, and JSON body.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    cookie: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None, Some(body)).await
}

/// POST with a token and no body at all.
pub async fn post_empty_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None, None).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(token), None, Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None, None).await
}

/// Read and parse the body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// The `name=value` part of the response's `Set-Cookie` header.
pub fn session_cookie_pair(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create a quote through the API and return `data` (`{quote, version}`).
pub async fn create_quote(app: Router, token: &str, title: &str) -> serde_json::Value {
    let body = serde_json::json!({
        "title": title,
        "contact_name": "Dana Client",
        "contact_email": "dana@example.com",
    });
    let response = post_json_auth(app, "/api/v1/quotes", token, body).await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"].clone()
}

/// Publish a quote without email and return the plaintext access code.
pub async fn publish(app: Router, token: &str, quote_id: i64) -> String {
    let response = post_json_auth(
        app,
        &format!("/api/v1/quotes/{quote_id}/publish"),
        token,
        serde_json::json!({ "send_email": false }),
    )
    .await;
    assert_eq!(response.status(), 200);
    body_json(response).await["data"]["access_code"]["code"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Exchange a code for a session and return the cookie pair.
pub async fn client_login(app: Router, code: &str) -> String {
    let response = post_json(app, "/api/v1/client/access", serde_json::json!({ "code": code })).await;
    assert_eq!(response.status(), 200);
    session_cookie_pair(&response).unwrap()
}
