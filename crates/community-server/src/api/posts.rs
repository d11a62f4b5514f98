//! Post API handlers

use crate::auth::AuthUser;
use crate::db::queries::{self, PostFilter};
use crate::error::{ApiError, ApiResult};
use crate::models::*;
use crate::observability::{AuditEventType, AuditLogger};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<Json<ApiResponse<Post>>> {
    req.validate()?;

    let post = queries::create_post(&state.db, user.user_id, &user.nickname, &req).await?;

    AuditLogger::content(
        &state,
        AuditEventType::PostCreated,
        "post",
        &post.id.to_string(),
        &user.email,
    )
    .await;

    state
        .broadcast_event(WsEvent::PostCreated {
            post_id: post.id,
            author_id: post.author_id,
            title: post.title.clone(),
        })
        .await;

    Ok(Json(ApiResponse::ok(post)))
}

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListPostsQuery>,
) -> ApiResult<Json<ApiResponse<Page<Post>>>> {
    let page_query = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let (page, limit) = page_query.normalize();

    let filter = PostFilter {
        category: query.category,
        author_id: query.author_id,
        search: query.search,
        tag: query.tag,
    };
    let (posts, total) = queries::list_posts(&state.db, &filter, page, limit).await?;

    Ok(Json(ApiResponse::ok(Page {
        items: posts,
        page,
        limit,
        total,
    })))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Post>>> {
    let mut post = queries::get_post(&state.db, id)
        .await?
        .ok_or(ApiError::PostNotFound)?;

    queries::increment_view_count(&state.db, id).await?;
    post.view_count += 1;

    Ok(Json(ApiResponse::ok(post)))
}

pub async fn update_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePostRequest>,
) -> ApiResult<Json<ApiResponse<Post>>> {
    req.validate()?;

    let post = queries::get_post(&state.db, id)
        .await?
        .ok_or(ApiError::PostNotFound)?;
    if post.author_id != user.user_id {
        return Err(ApiError::Forbidden);
    }

    let updated = queries::update_post(&state.db, id, &req)
        .await?
        .ok_or(ApiError::PostNotFound)?;

    AuditLogger::content(
        &state,
        AuditEventType::PostUpdated,
        "post",
        &id.to_string(),
        &user.email,
    )
    .await;

    Ok(Json(ApiResponse::ok(updated)))
}

pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let post = queries::get_post(&state.db, id)
        .await?
        .ok_or(ApiError::PostNotFound)?;

    // Authors delete their own posts; staff can delete anything
    if post.author_id != user.user_id && !user.role.is_staff() {
        return Err(ApiError::Forbidden);
    }

    if !queries::soft_delete_post(&state.db, id).await? {
        return Err(ApiError::PostNotFound);
    }

    AuditLogger::content(
        &state,
        AuditEventType::PostDeleted,
        "post",
        &id.to_string(),
        &user.email,
    )
    .await;

    Ok(Json(ApiResponse::message("Post deleted")))
}

pub async fn like_post(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<LikeResponse>>> {
    let post = queries::get_post(&state.db, id)
        .await?
        .ok_or(ApiError::PostNotFound)?;

    let result = queries::toggle_post_like(&state.db, id, user.user_id).await?;

    // Notify the author on a fresh like, never on an unlike or a self-like
    if result.liked && post.author_id != user.user_id {
        let req = CreateNotificationRequest {
            user_id: post.author_id,
            title: "New like".to_string(),
            message: format!("{} liked your post \"{}\"", user.nickname, post.title),
            kind: NotificationKind::LikeReceived,
            related_id: Some(post.id),
        };
        match queries::create_notification(&state.db, &req).await {
            Ok(notification) => {
                state
                    .broadcast_event(WsEvent::Notification {
                        user_id: post.author_id,
                        notification,
                    })
                    .await;
            }
            Err(e) => debug!("Failed to create like notification: {}", e),
        }
    }

    Ok(Json(ApiResponse::ok(result)))
}
