//! Web3 community platform backend.
//!
//! REST API over PostgreSQL with JWT authentication, a real-time
//! WebSocket event feed, per-IP rate limiting and Prometheus metrics.

pub mod api;
pub mod auth;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod state;
pub mod websocket;

use crate::models::ApiResponse;
use crate::state::AppState;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

async fn health() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::ok(serde_json::json!({
        "status": "ok",
        "version": VERSION,
    })))
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.encode(),
    )
}

/// Assemble the full application router
pub fn build_router(state: Arc<AppState>) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(api::auth::register))
        .route("/login", post(api::auth::login))
        .route("/refresh", post(api::auth::refresh))
        .route("/logout", post(api::auth::logout))
        .route("/password", put(api::auth::change_password))
        .route("/validate", get(api::auth::validate));

    let user_routes = Router::new()
        .route("/", get(api::users::list_users))
        .route("/me", get(api::users::me).put(api::users::update_me))
        .route(
            "/:id",
            get(api::users::get_user).delete(api::users::deactivate_user),
        )
        .route("/:id/role", put(api::users::update_role));

    let post_routes = Router::new()
        .route("/", post(api::posts::create_post).get(api::posts::list_posts))
        .route(
            "/:id",
            get(api::posts::get_post)
                .put(api::posts::update_post)
                .delete(api::posts::delete_post),
        )
        .route("/:id/like", post(api::posts::like_post))
        .route("/:id/comments", get(api::comments::list_comments))
        .route("/:id/comments/count", get(api::comments::count_comments));

    let comment_routes = Router::new()
        .route("/", post(api::comments::create_comment))
        .route(
            "/:id",
            put(api::comments::update_comment).delete(api::comments::delete_comment),
        )
        .route("/:id/like", post(api::comments::like_comment));

    let notification_routes = Router::new()
        .route(
            "/",
            post(api::notifications::create_notification)
                .get(api::notifications::list_notifications),
        )
        .route("/unread", get(api::notifications::list_unread))
        .route("/unread/count", get(api::notifications::unread_count))
        .route("/read-all", put(api::notifications::mark_all_read))
        .route("/:id/read", put(api::notifications::mark_read));

    let analytics_routes = Router::new()
        .route("/events", post(api::analytics::track_event))
        .route("/events/bulk", post(api::analytics::track_events_bulk))
        .route("/dashboard", get(api::analytics::dashboard))
        .route("/me", get(api::analytics::my_analytics))
        .route("/users/:id", get(api::analytics::user_analytics));

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(websocket::ws_handler))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/users", user_routes)
        .nest("/api/v1/posts", post_routes)
        .nest("/api/v1/comments", comment_routes)
        .nest("/api/v1/notifications", notification_routes)
        .nest("/api/v1/analytics", analytics_routes)
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit))
        .layer(from_fn_with_state(state.clone(), middleware::track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
