//! Notification API handlers

use crate::auth::AuthUser;
use crate::db::queries;
use crate::error::{ApiError, ApiResult};
use crate::models::*;
use crate::observability::{AuditEntry, AuditEventType, AuditLogger};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

/// Admin-only: send a notification to a specific user
pub async fn create_notification(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateNotificationRequest>,
) -> ApiResult<Json<ApiResponse<Notification>>> {
    user.require_admin()?;

    if req.title.is_empty() || req.title.len() > 200 {
        return Err(ApiError::InvalidInput(
            "Title must be between 1 and 200 characters".to_string(),
        ));
    }

    queries::get_user_by_id(&state.db, req.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(ApiError::UserNotFound)?;

    let notification = queries::create_notification(&state.db, &req).await?;

    AuditLogger::log(
        &state,
        AuditEntry::new(AuditEventType::NotificationSent)
            .entity("notification", &notification.id.to_string())
            .actor(&user.email),
    )
    .await;

    state
        .broadcast_event(WsEvent::Notification {
            user_id: notification.user_id,
            notification: notification.clone(),
        })
        .await;

    Ok(Json(ApiResponse::ok(notification)))
}

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<Notification>>>> {
    let notifications = queries::list_notifications(&state.db, user.user_id, false).await?;
    Ok(Json(ApiResponse::ok(notifications)))
}

pub async fn list_unread(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<Notification>>>> {
    let notifications = queries::list_notifications(&state.db, user.user_id, true).await?;
    Ok(Json(ApiResponse::ok(notifications)))
}

pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<UnreadCountResponse>>> {
    let unread_count = queries::unread_notification_count(&state.db, user.user_id).await?;
    Ok(Json(ApiResponse::ok(UnreadCountResponse { unread_count })))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Notification>>> {
    let notification = queries::mark_notification_read(&state.db, id, user.user_id)
        .await?
        .ok_or(ApiError::NotificationNotFound)?;
    Ok(Json(ApiResponse::ok(notification)))
}

pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<()>>> {
    let n = queries::mark_all_notifications_read(&state.db, user.user_id).await?;
    Ok(Json(ApiResponse::message(&format!(
        "{} notifications marked as read",
        n
    ))))
}
