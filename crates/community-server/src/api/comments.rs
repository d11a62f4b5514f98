//! Comment API handlers (threaded, soft-deleting)

use crate::auth::AuthUser;
use crate::db::queries;
use crate::error::{ApiError, ApiResult};
use crate::models::*;
use crate::observability::{AuditEventType, AuditLogger};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<Json<ApiResponse<CommentResponse>>> {
    req.validate()?;

    let post = queries::get_post(&state.db, req.post_id)
        .await?
        .ok_or(ApiError::PostNotFound)?;

    let depth = match req.parent_id {
        Some(parent_id) => {
            let parent = queries::get_comment(&state.db, parent_id)
                .await?
                .filter(|c| !c.is_deleted)
                .ok_or(ApiError::CommentNotFound)?;
            if parent.post_id != req.post_id {
                return Err(ApiError::InvalidInput(
                    "Parent comment belongs to a different post".to_string(),
                ));
            }
            parent.depth + 1
        }
        None => 0,
    };

    let comment = queries::create_comment(
        &state.db,
        req.post_id,
        req.parent_id,
        depth,
        user.user_id,
        &user.nickname,
        &req.content,
    )
    .await?;

    AuditLogger::content(
        &state,
        AuditEventType::CommentCreated,
        "comment",
        &comment.id.to_string(),
        &user.email,
    )
    .await;

    state
        .broadcast_event(WsEvent::CommentAdded {
            post_id: comment.post_id,
            comment_id: comment.id,
            author_id: comment.author_id,
        })
        .await;

    if post.author_id != user.user_id {
        let notif_req = CreateNotificationRequest {
            user_id: post.author_id,
            title: "New comment".to_string(),
            message: format!("{} commented on \"{}\"", user.nickname, post.title),
            kind: NotificationKind::CommentAdded,
            related_id: Some(post.id),
        };
        match queries::create_notification(&state.db, &notif_req).await {
            Ok(notification) => {
                state
                    .broadcast_event(WsEvent::Notification {
                        user_id: post.author_id,
                        notification,
                    })
                    .await;
            }
            Err(e) => debug!("Failed to create comment notification: {}", e),
        }
    }

    Ok(Json(ApiResponse::ok(CommentResponse::from(&comment))))
}

/// Comments for a post, assembled into a thread tree
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<CommentResponse>>>> {
    queries::get_post(&state.db, post_id)
        .await?
        .ok_or(ApiError::PostNotFound)?;

    let comments = queries::list_comments_by_post(&state.db, post_id).await?;
    let flat: Vec<CommentResponse> = comments.iter().map(CommentResponse::from).collect();
    Ok(Json(ApiResponse::ok(build_comment_tree(flat))))
}

pub async fn count_comments(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<i64>>> {
    queries::get_post(&state.db, post_id)
        .await?
        .ok_or(ApiError::PostNotFound)?;

    let count = queries::count_comments(&state.db, post_id).await?;
    Ok(Json(ApiResponse::ok(count)))
}

pub async fn update_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCommentRequest>,
) -> ApiResult<Json<ApiResponse<CommentResponse>>> {
    if req.content.is_empty() || req.content.len() > 2000 {
        return Err(ApiError::InvalidInput(
            "Content must be between 1 and 2000 characters".to_string(),
        ));
    }

    let comment = queries::get_comment(&state.db, id)
        .await?
        .filter(|c| !c.is_deleted)
        .ok_or(ApiError::CommentNotFound)?;
    if comment.author_id != user.user_id {
        return Err(ApiError::Forbidden);
    }

    let updated = queries::update_comment(&state.db, id, &req.content)
        .await?
        .ok_or(ApiError::CommentNotFound)?;

    AuditLogger::content(
        &state,
        AuditEventType::CommentUpdated,
        "comment",
        &id.to_string(),
        &user.email,
    )
    .await;

    Ok(Json(ApiResponse::ok(CommentResponse::from(&updated))))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let comment = queries::get_comment(&state.db, id)
        .await?
        .filter(|c| !c.is_deleted)
        .ok_or(ApiError::CommentNotFound)?;

    if comment.author_id != user.user_id && !user.role.is_staff() {
        return Err(ApiError::Forbidden);
    }

    if !queries::soft_delete_comment(&state.db, id).await? {
        return Err(ApiError::CommentNotFound);
    }

    AuditLogger::content(
        &state,
        AuditEventType::CommentDeleted,
        "comment",
        &id.to_string(),
        &user.email,
    )
    .await;

    Ok(Json(ApiResponse::message("Comment deleted")))
}

pub async fn like_comment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<LikeResponse>>> {
    queries::get_comment(&state.db, id)
        .await?
        .filter(|c| !c.is_deleted)
        .ok_or(ApiError::CommentNotFound)?;

    let result = queries::toggle_comment_like(&state.db, id, user.user_id).await?;
    Ok(Json(ApiResponse::ok(result)))
}
