//! JWT claim structures for authentication tokens.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for access tokens.
///
/// Embedded in access tokens so that authentication and authorization
/// decisions need no database lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    /// User's email address, if one is on file
    pub email: Option<String>,
    /// The user's role slug (student, teacher, admin, super_admin)
    pub role: String,
    /// Permission slugs granted through the role
    pub permissions: Vec<String>,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

/// JWT claims for refresh tokens.
///
/// Refresh tokens are long-lived and used to obtain new access tokens
/// without re-authenticating. The `jti` ties the token to its database row
/// and to the blacklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    /// User ID (subject claim)
    pub sub: String,
    /// Session this token belongs to
    pub session_id: Uuid,
    /// Unique token identifier (JWT ID), the revocation handle
    pub jti: String,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_roundtrip() {
        let claims = Claims {
            sub: "user-id-123".to_string(),
            email: Some("test@example.com".to_string()),
            role: "teacher".to_string(),
            permissions: vec!["courses:create".to_string()],
            exp: 1234567890,
            iat: 1234567800,
        };
        let json = serde_json::to_string(&claims).unwrap();
        let back: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sub, "user-id-123");
        assert_eq!(back.role, "teacher");
        assert_eq!(back.permissions, vec!["courses:create".to_string()]);
    }

    #[test]
    fn refresh_claims_carry_jti_and_session() {
        let session_id = Uuid::new_v4();
        let claims = RefreshTokenClaims {
            sub: "user-123".to_string(),
            session_id,
            jti: "jti-abc".to_string(),
            exp: 9999999999,
            iat: 9999999900,
        };
        let json = serde_json::to_string(&claims).unwrap();
        let back: RefreshTokenClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(back.session_id, session_id);
        assert_eq!(back.jti, "jti-abc");
    }
}
