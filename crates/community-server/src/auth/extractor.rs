//! Request extractor for authenticated users

use crate::auth::{jwt, token_fingerprint};
use crate::error::ApiError;
use crate::models::Role;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::sync::Arc;
use uuid::Uuid;

pub const BEARER_PREFIX: &str = "Bearer ";

/// Authenticated caller, extracted from the `Authorization` header.
/// Handlers that take this as an argument reject unauthenticated requests.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub nickname: String,
    /// Raw bearer token, kept for logout blacklisting
    pub token: String,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role != Role::Admin {
            return Err(ApiError::Forbidden);
        }
        Ok(())
    }

    pub fn require_staff(&self) -> Result<(), ApiError> {
        if !self.role.is_staff() {
            return Err(ApiError::Forbidden);
        }
        Ok(())
    }
}

/// Validate a bearer token against the signing key and the logout blacklist
pub fn authenticate(state: &AppState, token: &str) -> Result<AuthUser, ApiError> {
    if state.is_token_blacklisted(&token_fingerprint(token)) {
        return Err(ApiError::TokenInvalid);
    }

    let claims = jwt::validate_token(&state.auth, token)?;

    // Refresh tokens carry no profile claims and are not valid for API access
    let email = claims.email.ok_or(ApiError::TokenInvalid)?;
    let role = claims.role.ok_or(ApiError::TokenInvalid)?;

    Ok(AuthUser {
        user_id: claims.sub,
        email,
        role,
        nickname: claims.nickname.unwrap_or_default(),
        token: token.to_string(),
    })
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or(ApiError::Unauthorized)?;

        authenticate(state, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{generate_access_token, generate_refresh_token};
    use crate::state::AppState;

    fn state() -> AppState {
        AppState::for_tests("extractor-test-secret")
    }

    #[test]
    fn test_authenticate_valid_token() {
        let state = state();
        let token = generate_access_token(
            &state.auth,
            Uuid::from_u128(9),
            "bob@example.com",
            Role::User,
            "bob",
        )
        .unwrap();

        let user = authenticate(&state, &token).unwrap();
        assert_eq!(user.user_id, Uuid::from_u128(9));
        assert_eq!(user.email, "bob@example.com");
        assert_eq!(user.nickname, "bob");
    }

    #[test]
    fn test_refresh_token_not_valid_for_api() {
        let state = state();
        let token = generate_refresh_token(&state.auth, Uuid::from_u128(9)).unwrap();
        assert!(matches!(
            authenticate(&state, &token),
            Err(ApiError::TokenInvalid)
        ));
    }

    #[test]
    fn test_blacklisted_token_rejected() {
        let state = state();
        let token =
            generate_access_token(&state.auth, Uuid::from_u128(9), "b@c.d", Role::User, "bob")
                .unwrap();

        let expires_at = chrono::Utc::now().timestamp() + 3600;
        state.blacklist_token(&token_fingerprint(&token), expires_at);
        assert!(matches!(
            authenticate(&state, &token),
            Err(ApiError::TokenInvalid)
        ));
    }

    #[test]
    fn test_role_gates() {
        let user = AuthUser {
            user_id: Uuid::from_u128(1),
            email: "a@b.c".to_string(),
            role: Role::Moderator,
            nickname: "mod".to_string(),
            token: String::new(),
        };
        assert!(user.require_staff().is_ok());
        assert!(matches!(user.require_admin(), Err(ApiError::Forbidden)));
    }
}
