//! Authentication: JWT issuance/validation, password hashing, extractors

pub mod extractor;
pub mod jwt;
pub mod password;

pub use extractor::AuthUser;
pub use jwt::{AuthConfig, Claims};

/// Hash a token for storage so the raw value never touches the database
pub fn token_fingerprint(token: &str) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(token.as_bytes()))
}
