//! Authentication API handlers

use crate::auth::{jwt, password, token_fingerprint, AuthUser};
use crate::db::queries;
use crate::error::{ApiError, ApiResult};
use crate::models::*;
use crate::observability::{AuditEventType, AuditLogger};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tracing::info;

/// Issue an access/refresh token pair and persist the refresh fingerprint
async fn issue_tokens(state: &AppState, user: &User) -> Result<LoginResponse, ApiError> {
    let access_token =
        jwt::generate_access_token(&state.auth, user.id, &user.email, user.role, &user.nickname)?;
    let refresh_token = jwt::generate_refresh_token(&state.auth, user.id)?;

    let expires_at =
        chrono::Utc::now() + chrono::Duration::seconds(state.auth.refresh_ttl_secs);
    queries::store_refresh_token(
        &state.db,
        user.id,
        &token_fingerprint(&refresh_token),
        expires_at,
    )
    .await?;

    Ok(LoginResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.auth.access_ttl_secs,
        user_id: user.id,
        email: user.email.clone(),
        role: user.role,
    })
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    req.validate()?;

    if queries::email_exists(&state.db, &req.email).await? {
        return Err(ApiError::DuplicateEmail);
    }
    if queries::nickname_exists(&state.db, &req.nickname, None).await? {
        return Err(ApiError::DuplicateNickname);
    }

    let password_hash = password::hash_password(&req.password)?;
    let user = queries::create_user(&state.db, &req.nickname, &req.email, &password_hash).await?;

    info!("User registered: {} ({})", user.nickname, user.id);
    AuditLogger::log(
        &state,
        crate::observability::AuditEntry::new(AuditEventType::UserRegistered)
            .entity("user", &user.id.to_string())
            .actor(&user.email),
    )
    .await;

    let tokens = issue_tokens(&state, &user).await?;
    Ok(Json(ApiResponse::ok(tokens)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    let user = match queries::get_user_by_email(&state.db, &req.email).await? {
        Some(u) => u,
        None => {
            AuditLogger::auth(&state, &req.email, false, Some("Unknown email")).await;
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !user.is_active {
        AuditLogger::auth(&state, &req.email, false, Some("Account deactivated")).await;
        return Err(ApiError::Unauthorized);
    }

    if !password::verify_password(&req.password, &user.password_hash) {
        AuditLogger::auth(&state, &req.email, false, Some("Bad password")).await;
        return Err(ApiError::InvalidCredentials);
    }

    AuditLogger::auth(&state, &req.email, true, None).await;
    let tokens = issue_tokens(&state, &user).await?;
    Ok(Json(ApiResponse::ok(tokens)))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRefreshRequest>,
) -> ApiResult<Json<ApiResponse<LoginResponse>>> {
    let claims = jwt::validate_token(&state.auth, &req.refresh_token)?;

    let stored = queries::get_refresh_token_hash(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::TokenInvalid)?;
    if stored != token_fingerprint(&req.refresh_token) {
        return Err(ApiError::TokenInvalid);
    }

    let user = queries::get_user_by_id(&state.db, claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or(ApiError::UserNotFound)?;

    // Single use: the old token dies before the new pair is issued
    queries::delete_refresh_token(&state.db, claims.sub).await?;

    AuditLogger::log(
        &state,
        crate::observability::AuditEntry::new(AuditEventType::TokenRefreshed)
            .entity("user", &user.id.to_string())
            .actor(&user.email),
    )
    .await;

    let tokens = issue_tokens(&state, &user).await?;
    Ok(Json(ApiResponse::ok(tokens)))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<()>>> {
    // Reject the access token for the rest of its natural lifetime
    let claims = jwt::validate_token(&state.auth, &user.token)?;
    state.blacklist_token(&token_fingerprint(&user.token), claims.exp);
    queries::delete_refresh_token(&state.db, user.user_id).await?;

    AuditLogger::log(
        &state,
        crate::observability::AuditEntry::new(AuditEventType::LoggedOut)
            .entity("user", &user.user_id.to_string())
            .actor(&user.email),
    )
    .await;

    Ok(Json(ApiResponse::message("Logout successful")))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<PasswordChangeRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    req.validate()?;

    let record = queries::get_user_by_id(&state.db, user.user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    if !password::verify_password(&req.current_password, &record.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let new_hash = password::hash_password(&req.new_password)?;
    queries::update_password(&state.db, user.user_id, &new_hash).await?;

    AuditLogger::log(
        &state,
        crate::observability::AuditEntry::new(AuditEventType::PasswordChanged)
            .entity("user", &user.user_id.to_string())
            .actor(&user.email),
    )
    .await;

    Ok(Json(ApiResponse::message("Password changed successfully")))
}

pub async fn validate(user: AuthUser) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(ApiResponse::ok(serde_json::json!({
        "user_id": user.user_id,
        "email": user.email,
        "role": user.role,
        "nickname": user.nickname,
    }))))
}
