//! API error taxonomy with stable error codes

use crate::models::ApiResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Result type for API handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors surfaced to API clients. Each variant maps to an HTTP status
/// and a stable machine-readable code.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Nickname already exists")]
    DuplicateNickname,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("User not found")]
    UserNotFound,

    #[error("Post not found")]
    PostNotFound,

    #[error("Comment not found")]
    CommentNotFound,

    #[error("Notification not found")]
    NotificationNotFound,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials
            | ApiError::TokenExpired
            | ApiError::TokenInvalid
            | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::DuplicateEmail | ApiError::DuplicateNickname => StatusCode::CONFLICT,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::UserNotFound
            | ApiError::PostNotFound
            | ApiError::CommentNotFound
            | ApiError::NotificationNotFound => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "C001",
            ApiError::Internal(_) => "C002",
            ApiError::InvalidCredentials => "A001",
            ApiError::TokenExpired => "A002",
            ApiError::TokenInvalid => "A003",
            ApiError::DuplicateEmail => "A004",
            ApiError::Unauthorized => "A005",
            ApiError::Forbidden => "A006",
            ApiError::UserNotFound => "U001",
            ApiError::DuplicateNickname => "U002",
            ApiError::PostNotFound => "P001",
            ApiError::CommentNotFound => "CM001",
            ApiError::NotificationNotFound => "N001",
            ApiError::RateLimited => "R001",
        }
    }
}

/// Map a unique-constraint name to the client error it represents.
/// Closes the race between an existence pre-check and the insert: a
/// concurrent duplicate still surfaces as a conflict, not a 500.
fn from_unique_constraint(constraint: Option<&str>) -> ApiError {
    match constraint {
        Some("users_email_key") => ApiError::DuplicateEmail,
        Some("users_nickname_key") => ApiError::DuplicateNickname,
        other => ApiError::Internal(format!(
            "Unique constraint violation: {}",
            other.unwrap_or("unknown")
        )),
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        if let Some(db) = e.downcast_ref::<tokio_postgres::Error>() {
            if db.code() == Some(&tokio_postgres::error::SqlState::UNIQUE_VIOLATION) {
                return from_unique_constraint(db.as_db_error().and_then(|d| d.constraint()));
            }
        }
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Request failed");
        }
        let body = ApiResponse::<()>::error(self.code(), &self.to_string());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_statuses() {
        assert_eq!(ApiError::DuplicateEmail.code(), "A004");
        assert_eq!(ApiError::DuplicateEmail.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::PostNotFound.code(), "P001");
        assert_eq!(ApiError::PostNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::RateLimited.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::Internal("db".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unique_violations_map_to_conflicts() {
        let err = from_unique_constraint(Some("users_email_key"));
        assert!(matches!(err, ApiError::DuplicateEmail));
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err = from_unique_constraint(Some("users_nickname_key"));
        assert!(matches!(err, ApiError::DuplicateNickname));
        assert_eq!(err.code(), "U002");
        assert_eq!(err.status(), StatusCode::CONFLICT);

        // Anything else is still unexpected
        let err = from_unique_constraint(Some("post_likes_pkey"));
        assert!(matches!(err, ApiError::Internal(_)));
        let err = from_unique_constraint(None);
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: ApiError = anyhow::anyhow!("pool exhausted").into();
        assert!(matches!(err, ApiError::Internal(_)));
        assert!(err.to_string().contains("pool exhausted"));
    }
}
