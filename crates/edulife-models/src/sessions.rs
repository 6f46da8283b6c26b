//! Session and refresh-token models.
//!
//! A session represents one authenticated device. Refresh tokens belong to
//! exactly one session; revoking the session revokes every token in its
//! lineage, and blacklisted `jti`s survive token row deletion as the
//! durable revocation record.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::ids::{RefreshTokenId, SessionId, UserId};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: UserId,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// A refresh token at rest.
///
/// Only the SHA-256 hash of the token string is stored; the `jti` links the
/// row to the JWT and to the blacklist.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RefreshTokenRecord {
    pub id: RefreshTokenId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub jti: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub jti: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// A durably revoked `jti`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BlacklistEntry {
    pub jti: String,
    /// When the underlying token would have expired; rows past this point
    /// can be purged.
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
