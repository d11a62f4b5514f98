//! Analytics API handlers

use crate::auth::AuthUser;
use crate::db::queries;
use crate::error::{ApiError, ApiResult};
use crate::models::*;
use crate::state::AppState;
use axum::extract::{ConnectInfo, Path, State};
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::Json;
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

const MAX_BULK_EVENTS: usize = 100;

/// Where a tracked event came from: proxy header first, then peer address
fn event_source(headers: &HeaderMap, addr: Option<&SocketAddr>) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| addr.map(|a| a.ip().to_string()));
    let agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    (ip, agent)
}

/// Track a single event. Anonymous callers are accepted; the user id is
/// attached only when a valid bearer token is present.
pub async fn track_event(
    State(state): State<Arc<AppState>>,
    user: Option<AuthUser>,
    addr: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<TrackEventRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    req.validate()?;

    let (ip, agent) = event_source(&headers, addr.as_ref().map(|c| &c.0));
    queries::insert_analytics_event(
        &state.db,
        user.map(|u| u.user_id),
        ip.as_deref(),
        agent.as_deref(),
        &req,
    )
    .await?;

    Ok(Json(ApiResponse::message("Event tracked")))
}

pub async fn track_events_bulk(
    State(state): State<Arc<AppState>>,
    user: Option<AuthUser>,
    addr: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(events): Json<Vec<TrackEventRequest>>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if events.is_empty() || events.len() > MAX_BULK_EVENTS {
        return Err(ApiError::InvalidInput(format!(
            "Bulk requests must contain between 1 and {} events",
            MAX_BULK_EVENTS
        )));
    }
    for event in &events {
        event.validate()?;
    }

    let user_id = user.map(|u| u.user_id);
    let (ip, agent) = event_source(&headers, addr.as_ref().map(|c| &c.0));
    queries::insert_analytics_events(&state.db, user_id, ip.as_deref(), agent.as_deref(), &events)
        .await?;

    Ok(Json(ApiResponse::message(&format!(
        "{} events tracked",
        events.len()
    ))))
}

/// Staff-only platform totals and 24h event breakdown
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<DashboardResponse>>> {
    user.require_staff()?;
    let dashboard = queries::dashboard_analytics(&state.db).await?;
    Ok(Json(ApiResponse::ok(dashboard)))
}

pub async fn my_analytics(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<UserAnalyticsResponse>>> {
    let analytics = queries::user_analytics(&state.db, user.user_id).await?;
    Ok(Json(ApiResponse::ok(analytics)))
}

pub async fn user_analytics(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<UserAnalyticsResponse>>> {
    user.require_admin()?;

    queries::get_user_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let analytics = queries::user_analytics(&state.db, id).await?;
    Ok(Json(ApiResponse::ok(analytics)))
}
