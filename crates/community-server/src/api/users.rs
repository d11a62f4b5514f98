//! User profile API handlers

use crate::auth::AuthUser;
use crate::db::queries;
use crate::error::{ApiError, ApiResult};
use crate::models::*;
use crate::observability::{AuditEntry, AuditEventType, AuditLogger};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use std::sync::Arc;
use uuid::Uuid;

pub async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let record = queries::get_user_by_id(&state.db, user.user_id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(ApiError::UserNotFound)?;
    Ok(Json(ApiResponse::ok(UserResponse::from(&record))))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    req.validate()?;

    if let Some(ref nickname) = req.nickname {
        if queries::nickname_exists(&state.db, nickname, Some(user.user_id)).await? {
            return Err(ApiError::DuplicateNickname);
        }
    }

    let updated = queries::update_user_profile(&state.db, user.user_id, &req)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    AuditLogger::log(
        &state,
        AuditEntry::new(AuditEventType::UserUpdated)
            .entity("user", &user.user_id.to_string())
            .actor(&user.email),
    )
    .await;

    Ok(Json(ApiResponse::ok(UserResponse::from(&updated))))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    let record = queries::get_user_by_id(&state.db, id)
        .await?
        .filter(|u| u.is_active)
        .ok_or(ApiError::UserNotFound)?;
    Ok(Json(ApiResponse::ok(UserResponse::from(&record))))
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<ApiResponse<Page<UserResponse>>>> {
    let (page, limit) = query.normalize();
    let (users, total) = queries::list_users(&state.db, page, limit).await?;

    Ok(Json(ApiResponse::ok(Page {
        items: users.iter().map(UserResponse::from).collect(),
        page,
        limit,
        total,
    })))
}

pub async fn update_role(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> ApiResult<Json<ApiResponse<UserResponse>>> {
    user.require_admin()?;

    let updated = queries::update_user_role(&state.db, id, req.role)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    AuditLogger::log(
        &state,
        AuditEntry::new(AuditEventType::RoleChanged)
            .entity("user", &id.to_string())
            .actor(&user.email)
            .with_payload(serde_json::json!({ "role": req.role.as_str() })),
    )
    .await;

    Ok(Json(ApiResponse::ok(UserResponse::from(&updated))))
}

pub async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    user.require_admin()?;

    if !queries::deactivate_user(&state.db, id).await? {
        return Err(ApiError::UserNotFound);
    }
    // A deactivated account cannot mint new access tokens
    queries::delete_refresh_token(&state.db, id).await?;

    AuditLogger::log(
        &state,
        AuditEntry::new(AuditEventType::UserDeactivated)
            .entity("user", &id.to_string())
            .actor(&user.email),
    )
    .await;

    Ok(Json(ApiResponse::message("User deactivated")))
}
