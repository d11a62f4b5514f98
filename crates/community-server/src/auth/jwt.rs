//! JWT issuance and validation (HS256)

use crate::error::ApiError;
use crate::models::Role;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ISSUER: &str = "web3-community";

/// Access tokens are short-lived; refresh tokens last a week
pub const ACCESS_TOKEN_TTL_SECS: i64 = 3600;
pub const REFRESH_TOKEN_TTL_SECS: i64 = 604_800;

/// Validated at startup and passed explicitly into `AppState`
#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl AuthConfig {
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            access_ttl_secs: ACCESS_TOKEN_TTL_SECS,
            refresh_ttl_secs: REFRESH_TOKEN_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// Profile claims, present on access tokens only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

pub fn generate_access_token(
    config: &AuthConfig,
    user_id: Uuid,
    email: &str,
    role: Role,
    nickname: &str,
) -> Result<String, ApiError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        iss: ISSUER.to_string(),
        iat: now,
        exp: now + config.access_ttl_secs,
        email: Some(email.to_string()),
        role: Some(role),
        nickname: Some(nickname.to_string()),
    };
    sign(config, &claims)
}

pub fn generate_refresh_token(config: &AuthConfig, user_id: Uuid) -> Result<String, ApiError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        iss: ISSUER.to_string(),
        iat: now,
        exp: now + config.refresh_ttl_secs,
        email: None,
        role: None,
        nickname: None,
    };
    sign(config, &claims)
}

fn sign(config: &AuthConfig, claims: &Claims) -> Result<String, ApiError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("Token signing failed: {}", e)))
}

/// Decode and validate a token. Distinguishes expiry from other failures
/// so clients know when to refresh.
pub fn validate_token(config: &AuthConfig, token: &str) -> Result<Claims, ApiError> {
    let key = DecodingKey::from_secret(config.secret.as_bytes());
    let mut validation = Validation::default();
    validation.set_issuer(&[ISSUER]);

    match decode::<Claims>(token, &key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) => match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(ApiError::TokenExpired),
            _ => Err(ApiError::TokenInvalid),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new("test-secret".to_string())
    }

    #[test]
    fn test_access_token_round_trip() {
        let cfg = config();
        let user_id = Uuid::from_u128(42);
        let token =
            generate_access_token(&cfg, user_id, "alice@example.com", Role::Admin, "alice")
                .unwrap();

        let claims = validate_token(&cfg, &token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email.as_deref(), Some("alice@example.com"));
        assert_eq!(claims.role, Some(Role::Admin));
        assert_eq!(claims.nickname.as_deref(), Some("alice"));
        assert_eq!(claims.iss, ISSUER);
    }

    #[test]
    fn test_refresh_token_carries_no_profile() {
        let cfg = config();
        let token = generate_refresh_token(&cfg, Uuid::from_u128(7)).unwrap();
        let claims = validate_token(&cfg, &token).unwrap();
        assert!(claims.email.is_none());
        assert!(claims.role.is_none());
        assert!(claims.nickname.is_none());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let cfg = config();
        let token =
            generate_access_token(&cfg, Uuid::from_u128(1), "a@b.c", Role::User, "a").unwrap();

        let other = AuthConfig::new("different-secret".to_string());
        assert!(matches!(
            validate_token(&other, &token),
            Err(ApiError::TokenInvalid)
        ));
    }

    #[test]
    fn test_expired_token_reports_expiry() {
        let mut cfg = config();
        cfg.access_ttl_secs = -120;
        let token =
            generate_access_token(&cfg, Uuid::from_u128(1), "a@b.c", Role::User, "a").unwrap();
        assert!(matches!(
            validate_token(&cfg, &token),
            Err(ApiError::TokenExpired)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(matches!(
            validate_token(&config(), "not.a.jwt"),
            Err(ApiError::TokenInvalid)
        ));
    }
}
