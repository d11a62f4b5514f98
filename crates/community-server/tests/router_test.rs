//! Router-level tests. These exercise routing, extractors, validation and
//! middleware without a live database; nothing here checks out a connection.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use community_server::auth::jwt::generate_access_token;
use community_server::build_router;
use community_server::models::Role;
use community_server::state::AppState;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "router-test-secret";

fn app() -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::for_tests(SECRET));
    (build_router(state.clone()), state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _) = app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "ok");
}

#[tokio::test]
async fn metrics_endpoint_exposes_request_counts() {
    let (app, _) = app();

    // One request through the metrics middleware first
    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("http_requests_total"));
    assert!(text.contains("http_request_duration_seconds"));
}

#[tokio::test]
async fn protected_routes_require_auth() {
    let (app, _) = app();

    for (method, path) in [
        ("GET", "/api/v1/users/me"),
        ("POST", "/api/v1/posts"),
        ("GET", "/api/v1/notifications"),
        ("GET", "/api/v1/analytics/dashboard"),
        ("POST", "/api/v1/auth/logout"),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{} {} should be protected",
            method,
            path
        );
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error_code"], "A005");
    }
}

#[tokio::test]
async fn garbage_bearer_token_is_rejected() {
    let (app, _) = app();
    let response = app
        .oneshot(
            Request::get("/api/v1/users/me")
                .header(header::AUTHORIZATION, "Bearer not.a.jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error_code"], "A003");
}

#[tokio::test]
async fn valid_token_passes_the_extractor() {
    let (app, state) = app();
    let token = generate_access_token(
        &state.auth,
        Uuid::from_u128(1),
        "alice@example.com",
        Role::User,
        "alice",
    )
    .unwrap();

    // /auth/validate echoes the claims without touching the database
    let response = app
        .oneshot(
            Request::get("/api/v1/auth/validate")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["email"], "alice@example.com");
    assert_eq!(json["data"]["nickname"], "alice");
}

#[tokio::test]
async fn register_rejects_invalid_input() {
    let (app, _) = app();
    let body = serde_json::json!({
        "email": "not-an-email",
        "password": "hunter2hunter2",
        "nickname": "alice",
    });
    let response = app
        .oneshot(
            Request::post("/api/v1/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error_code"], "C001");
}

#[tokio::test]
async fn create_post_validates_before_touching_storage() {
    let (app, state) = app();
    let token = generate_access_token(
        &state.auth,
        Uuid::from_u128(1),
        "alice@example.com",
        Role::User,
        "alice",
    )
    .unwrap();

    let body = serde_json::json!({
        "title": "",
        "content": "hello",
    });
    let response = app
        .oneshot(
            Request::post("/api/v1/posts")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_admin_cannot_change_roles() {
    let (app, state) = app();
    let token = generate_access_token(
        &state.auth,
        Uuid::from_u128(1),
        "bob@example.com",
        Role::User,
        "bob",
    )
    .unwrap();

    let response = app
        .oneshot(
            Request::put(format!("/api/v1/users/{}/role", Uuid::from_u128(2)))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"role":"admin"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["error_code"], "A006");
}

#[tokio::test]
async fn bulk_events_rejected_whole_before_any_insert() {
    let (app, _) = app();

    // Over the batch cap
    let oversized: Vec<_> = (0..101)
        .map(|i| serde_json::json!({ "event_type": format!("e{}", i) }))
        .collect();
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/v1/analytics/events/bulk")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_string(&oversized).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // One bad event poisons the whole batch
    let mixed = serde_json::json!([
        { "event_type": "page_view" },
        { "event_type": "" },
    ]);
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/v1/analytics/events/bulk")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(mixed.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(
            Request::post("/api/v1/analytics/events/bulk")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("[]"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (app, _) = app();
    let response = app
        .oneshot(Request::get("/api/v1/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rate_limit_returns_429_after_budget() {
    let (app, _) = app();

    // All requests share the "unknown" client key in this harness
    let mut last_status = StatusCode::OK;
    for _ in 0..61 {
        let response = app
            .clone()
            .oneshot(
                Request::get("/api/v1/auth/validate")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        last_status = response.status();
    }
    assert_eq!(last_status, StatusCode::TOO_MANY_REQUESTS);

    // Health is exempt from rate limiting
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
