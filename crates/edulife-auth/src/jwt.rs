//! JWT creation and verification.
//!
//! Verification distinguishes an expired token from an otherwise invalid
//! one via [`TokenError`], because the auth service reports `TokenExpired`
//! as its own error kind.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use edulife_config::JwtConfig;
use edulife_core::AppError;

use crate::claims::{Claims, RefreshTokenClaims};

/// Why a token failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Signature is valid but the token is past its `exp`.
    Expired,
    /// Malformed, tampered with, or signed with a different secret.
    Invalid,
}

/// Creates an access token with the user's role and permission slugs.
///
/// # Errors
///
/// Returns an error if token encoding fails (e.g. invalid secret key).
pub fn create_access_token(
    user_id: Uuid,
    email: Option<&str>,
    role: &str,
    permissions: Vec<String>,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let exp = (now + jwt_config.access_token_expiry) as usize;
    let now = now as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        email: email.map(str::to_string),
        role: role.to_string(),
        permissions,
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create token: {}", e)))
}

/// Creates a refresh token bound to a session, identified by `jti`.
pub fn create_refresh_token(
    user_id: Uuid,
    session_id: Uuid,
    jti: &str,
    jwt_config: &JwtConfig,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let exp = (now + jwt_config.refresh_token_expiry) as usize;
    let now = now as usize;

    let claims = RefreshTokenClaims {
        sub: user_id.to_string(),
        session_id,
        jti: jti.to_string(),
        exp,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_config.secret.as_bytes()),
    )
    .map_err(|e| AppError::internal_error(format!("Failed to create refresh token: {}", e)))
}

/// Verifies an access token and returns its claims.
pub fn verify_access_token(token: &str, jwt_config: &JwtConfig) -> Result<Claims, TokenError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(classify)
}

/// Verifies a refresh token and returns its claims.
pub fn verify_refresh_token(
    token: &str,
    jwt_config: &JwtConfig,
) -> Result<RefreshTokenClaims, TokenError> {
    decode::<RefreshTokenClaims>(
        token,
        &DecodingKey::from_secret(jwt_config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(classify)
}

fn classify(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        }
    }

    #[test]
    fn access_token_roundtrip() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let token = create_access_token(
            user_id,
            Some("user@example.com"),
            "student",
            vec!["courses:read".to_string()],
            &config,
        )
        .unwrap();

        let claims = verify_access_token(&token, &config).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "student");
        assert_eq!(claims.permissions, vec!["courses:read".to_string()]);
    }

    #[test]
    fn refresh_token_roundtrip() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let token = create_refresh_token(user_id, session_id, "jti-1", &config).unwrap();

        let claims = verify_refresh_token(&token, &config).unwrap();
        assert_eq!(claims.session_id, session_id);
        assert_eq!(claims.jti, "jti-1");
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let config = test_config();
        let token =
            create_access_token(Uuid::new_v4(), None, "student", vec![], &config).unwrap();

        let other = JwtConfig {
            secret: "different-secret".to_string(),
            ..config
        };
        assert_eq!(
            verify_access_token(&token, &other).unwrap_err(),
            TokenError::Invalid
        );
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let config = JwtConfig {
            secret: "test-secret".to_string(),
            // Issued already expired (exp = now - 120, outside default leeway)
            access_token_expiry: -120,
            refresh_token_expiry: -120,
        };
        let token =
            create_access_token(Uuid::new_v4(), None, "student", vec![], &config).unwrap();
        assert_eq!(
            verify_access_token(&token, &config).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn garbage_is_invalid() {
        let config = test_config();
        assert_eq!(
            verify_access_token("not.a.token", &config).unwrap_err(),
            TokenError::Invalid
        );
    }
}
