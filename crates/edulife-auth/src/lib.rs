//! # EduLife Auth
//!
//! JWT token creation and verification for the EduLife backend.
//!
//! Two token types exist:
//!
//! - **Access tokens** ([`Claims`]): short-lived, carry the user's role and
//!   permission slugs so authorization checks need no database round trip.
//! - **Refresh tokens** ([`RefreshTokenClaims`]): long-lived, bound to a
//!   session and identified by a `jti` so individual tokens can be revoked
//!   and blacklisted durably.
//!
//! # Example
//!
//! ```ignore
//! use edulife_auth::{create_access_token, verify_access_token};
//! use edulife_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token(user_id, Some("user@example.com"), "teacher", permissions, &config)?;
//! let claims = verify_access_token(&token, &config)?;
//! ```

pub mod claims;
pub mod jwt;

pub use claims::{Claims, RefreshTokenClaims};
pub use jwt::{
    TokenError, create_access_token, create_refresh_token, verify_access_token,
    verify_refresh_token,
};
