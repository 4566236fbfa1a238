//! Token-based authentication module.
//!
//! Staff log in with email + password; credentials are stored as salted
//! SHA-256 digests and compared in constant time. Sessions are HS256
//! bearer tokens carrying the caller's role.

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Session token lifetime.
pub const TOKEN_TTL_SECS: i64 = 60 * 60 * 24;

/// Role string carried by admin session tokens. Admin is not a stored
/// user; it logs in against configured credentials.
pub const ADMIN_ROLE: &str = "system admin";

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Account ID (or the fixed admin ID)
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issue a signed session token.
pub fn issue_token(secret: &str, sub: &str, email: &str, role: &str) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = AuthClaims {
        sub: sub.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}

/// Verify a session token and return its claims.
pub fn verify_token(secret: &str, token: &str) -> Result<AuthClaims, AppError> {
    decode::<AuthClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))
}

/// Generate a fresh per-user salt.
pub fn generate_salt() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Derive the stored digest for a password and salt.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check a password against stored credential material.
pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    constant_time_compare(&hash_password(password, salt), expected_hash)
}

/// Perform constant-time string comparison.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    // Constant-time comparison
    a_bytes.ct_eq(b_bytes).into()
}

/// Middleware for routes that require a logged-in caller.
///
/// On success the verified claims are inserted into request extensions
/// for handlers to read.
pub async fn require_auth(secret: String, mut request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string());

    match token {
        Some(token) => match verify_token(&secret, &token) {
            Ok(claims) => {
                request.extensions_mut().insert(claims);
                next.run(request).await
            }
            Err(e) => e.into_response(),
        },
        None => AppError::Unauthorized("Missing bearer token".to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let token = issue_token("secret", "user-1", "t@school.edu", "teacher").unwrap();
        let claims = verify_token("secret", &token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "t@school.edu");
        assert_eq!(claims.role, "teacher");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_rejects_wrong_secret() {
        let token = issue_token("secret", "user-1", "t@school.edu", "teacher").unwrap();
        assert!(verify_token("other-secret", &token).is_err());
    }

    #[test]
    fn test_token_rejects_garbage() {
        assert!(verify_token("secret", "not-a-token").is_err());
    }

    #[test]
    fn test_password_round_trip() {
        let salt = generate_salt();
        let hash = hash_password("hunter2", &salt);

        assert!(verify_password("hunter2", &salt, &hash));
        assert!(!verify_password("hunter3", &salt, &hash));
    }

    #[test]
    fn test_same_password_different_salts_differ() {
        let a = hash_password("hunter2", &generate_salt());
        let b = hash_password("hunter2", &generate_salt());
        assert_ne!(a, b);
    }

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("test-key-123", "test-key-123"));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("test-key-123", "test-key-124"));
    }

    #[test]
    fn test_constant_time_compare_different_lengths() {
        assert!(!constant_time_compare("short", "much-longer-key"));
    }
}
