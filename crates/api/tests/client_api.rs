//! HTTP-level tests for the client portal: access codes, sessions, the
//! client quote view, and client actions.

mod common;

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get_auth, post_empty_auth, post_json, post_json_auth, send};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

/// A published quote with one rolled-up deliverable and one milestone.
/// Returns `(admin_token, quote_id, code)`.
async fn published_quote(pool: &PgPool, app: axum::Router) -> (String, i64, String) {
    let token = common::admin_token(pool).await;
    let data = common::create_quote(app.clone(), &token, "Website rebuild").await;
    let quote_id = data["quote"]["id"].as_i64().unwrap();
    let version_id = data["version"]["id"].as_i64().unwrap();

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/versions/{version_id}/deliverables"),
        &token,
        json!({ "title": "Build", "default_client_rate": 120.0 }),
    )
    .await;
    let deliverable_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    post_json_auth(
        app.clone(),
        &format!("/api/v1/deliverables/{deliverable_id}/milestones"),
        &token,
        json!({ "title": "Sprint 1", "hours": 5.0, "client_rate": 120.0, "cost_rate": 70.0 }),
    )
    .await;

    let code = common::publish(app, &token, quote_id).await;
    (token, quote_id, code)
}

async fn client_get(app: axum::Router, cookie: &str) -> axum::http::Response<axum::body::Body> {
    send(app, Method::GET, "/api/v1/client/quote", None, Some(cookie), None).await
}

async fn client_action(
    app: axum::Router,
    cookie: &str,
    body: serde_json::Value,
) -> axum::http::Response<axum::body::Body> {
    send(
        app,
        Method::POST,
        "/api/v1/client/quote/actions",
        None,
        Some(cookie),
        Some(body),
    )
    .await
}

// ---------------------------------------------------------------------------
// Access codes and sessions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn valid_code_sets_secure_session_cookie(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_token, quote_id, code) = published_quote(&pool, app.clone()).await;

    let response = post_json(app, "/api/v1/client/access", json!({ "code": code })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("qf_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Lax"));

    let json = body_json(response).await;
    assert_eq!(json["data"]["quote_id"], quote_id);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn code_entry_ignores_case_and_separators(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_token, _quote_id, code) = published_quote(&pool, app.clone()).await;

    let sloppy = code.to_lowercase().replace('-', " ");
    let response = post_json(app, "/api/v1/client/access", json!({ "code": sloppy })).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn wrong_code_is_401_with_message(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response =
        post_json(app, "/api/v1/client/access", json!({ "code": "AAAAA-BBBBB" })).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Access code is not valid. Check the code and try again");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn blank_code_is_validation_error(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(app, "/api/v1/client/access", json!({ "code": "   " })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn attempts_over_the_limit_are_429(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_token, _quote_id, code) = published_quote(&pool, app.clone()).await;

    // The test config allows three attempts per window.
    for _ in 0..3 {
        let response =
            post_json(app.clone(), "/api/v1/client/access", json!({ "code": "WRONG-CODE1" })).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the right code is refused once the budget is spent.
    let response = post_json(app, "/api/v1/client/access", json!({ "code": code })).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(response).await;
    assert_eq!(json["code"], "RATE_LIMITED");
}

/// POST a code as if it arrived over a socket from `peer`.
async fn access_from(
    app: axum::Router,
    peer: &str,
    forwarded_for: Option<&str>,
    code: &str,
) -> StatusCode {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/client/access")
        .header(CONTENT_TYPE, "application/json");
    if let Some(value) = forwarded_for {
        builder = builder.header("x-forwarded-for", value);
    }
    let mut request = builder
        .body(Body::from(json!({ "code": code }).to_string()))
        .unwrap();
    let addr: SocketAddr = format!("{peer}:40000").parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    app.oneshot(request).await.unwrap().status()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn forged_forwarded_for_does_not_reset_the_budget(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    published_quote(&pool, app.clone()).await;

    let mut statuses = Vec::new();
    for i in 0..5 {
        let spoofed = format!("10.9.9.{i}");
        let status = access_from(app.clone(), "198.51.100.7", Some(&spoofed), "WRONG-CODE1").await;
        statuses.push(status);
    }
    assert_eq!(
        statuses,
        [
            StatusCode::UNAUTHORIZED,
            StatusCode::UNAUTHORIZED,
            StatusCode::UNAUTHORIZED,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
        ]
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn trusted_proxy_keys_attempts_by_forwarded_client(pool: PgPool) {
    let mut config = common::test_config();
    config.trusted_proxies = vec!["10.0.0.1".parse().unwrap()];
    let app = common::build_test_app_with(pool.clone(), config, None);
    published_quote(&pool, app.clone()).await;

    for _ in 0..3 {
        let status = access_from(app.clone(), "10.0.0.1", Some("203.0.113.1"), "WRONG-CODE1").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    // A hop the client wrote itself does not buy a fresh budget.
    let status =
        access_from(app.clone(), "10.0.0.1", Some("6.6.6.6, 203.0.113.1"), "WRONG-CODE1").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Another client behind the same proxy is unaffected.
    let status = access_from(app, "10.0.0.1", Some("203.0.113.2"), "WRONG-CODE1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_or_tampered_session_is_401(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_token, _quote_id, code) = published_quote(&pool, app.clone()).await;

    let response = common::get(app.clone(), "/api/v1/client/quote").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = common::client_login(app.clone(), &code).await;
    let mid = cookie.len() - 12;
    let flipped = if &cookie[mid..=mid] == "A" { "B" } else { "A" };
    let tampered = format!("{}{}{}", &cookie[..mid], flipped, &cookie[mid + 1..]);

    let response = client_get(app, &tampered).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn revoking_the_code_ends_existing_sessions(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (token, quote_id, code) = published_quote(&pool, app.clone()).await;
    let cookie = common::client_login(app.clone(), &code).await;

    let response = client_get(app.clone(), &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_empty_auth(
        app.clone(),
        &format!("/api/v1/quotes/{quote_id}/access-code/revoke"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client_get(app.clone(), &cookie).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json(app, "/api/v1/client/access", json!({ "code": code })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Access code is no longer active. Ask for a new code");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn logout_clears_the_cookie(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(app, "/api/v1/client/logout", json!({})).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("qf_session=;"));
    assert!(cookie.contains("Max-Age=0"));
}

// ---------------------------------------------------------------------------
// Client quote view
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn client_view_hides_costs_and_margins(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_token, _quote_id, code) = published_quote(&pool, app.clone()).await;
    let cookie = common::client_login(app.clone(), &code).await;

    let response = client_get(app, &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    let data = &json["data"];
    assert_eq!(data["status"], "published");
    assert_eq!(data["version"]["subtotal"], 600.0);
    assert_eq!(data["version"]["tax_amount"], 60.0);
    assert_eq!(data["version"]["total"], 660.0);
    assert_eq!(data["deliverables"][0]["price"], 600.0);
    assert_eq!(data["deliverables"][0]["milestones"][0]["hours"], 5.0);

    let text = json.to_string();
    for hidden in ["total_cost", "margin", "cost_rate", "margin_percent"] {
        assert!(!text.contains(hidden), "client view must not expose {hidden}");
    }
}

// ---------------------------------------------------------------------------
// Client actions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn approval_requires_a_name(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_token, _quote_id, code) = published_quote(&pool, app.clone()).await;
    let cookie = common::client_login(app.clone(), &code).await;

    let response = client_action(app, &cookie, json!({ "action": "approve" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn approval_is_final_and_provisions_a_project(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (token, quote_id, code) = published_quote(&pool, app.clone()).await;
    let cookie = common::client_login(app.clone(), &code).await;

    let response = client_action(
        app.clone(),
        &cookie,
        json!({ "action": "approve", "client_name": "Dana Client" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["action"], "approved");
    assert_eq!(json["data"]["status"], "approved");
    assert!(json["data"]["project_id"].is_i64());

    let response = client_action(
        app.clone(),
        &cookie,
        json!({ "action": "reject", "client_name": "Dana Client" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Notes are still accepted after the decision.
    let response = client_action(
        app.clone(),
        &cookie,
        json!({ "action": "note", "note": "Looking forward to kickoff" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get_auth(app, &format!("/api/v1/quotes/{quote_id}/actions"), &token).await;
    let json = body_json(response).await;
    let actions: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["approved", "noted"]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_action_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let (_token, _quote_id, code) = published_quote(&pool, app.clone()).await;
    let cookie = common::client_login(app.clone(), &code).await;

    let response = client_action(app, &cookie, json!({ "action": "escalate" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
