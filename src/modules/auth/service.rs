//! Registration, login with lockout, refresh-token rotation, and logout.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use edulife_auth::jwt::{
    create_access_token, create_refresh_token, verify_refresh_token, TokenError,
};
use edulife_config::{JwtConfig, SecurityConfig};
use edulife_core::{hash_password, verify_password, AppError};
use edulife_models::audit::{actions, NewAuditEntry};
use edulife_models::ids::SessionId;
use edulife_models::sessions::{NewRefreshToken, NewSession};
use edulife_models::users::{AuthError, AuthTokens, LoginDto, NewUser, RegisterDto, User, UserRole};

use crate::store::Store;

pub struct AuthService {
    store: Arc<dyn Store>,
    jwt: JwtConfig,
    security: SecurityConfig,
}

/// Refresh tokens are stored hashed; a database leak never yields usable
/// tokens.
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, jwt: JwtConfig, security: SecurityConfig) -> Self {
        Self {
            store,
            jwt,
            security,
        }
    }

    #[instrument(skip(self, dto))]
    pub async fn register(&self, dto: RegisterDto, role: UserRole) -> Result<User, AuthError> {
        dto.validate()
            .map_err(|e| AuthError::Storage(AppError::validation(e.to_string())))?;
        if dto.email.is_none() && dto.phone.is_none() {
            return Err(AuthError::MissingIdentifier);
        }

        let email = dto
            .email
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e: edulife_models::value_types::ValueTypeError| {
                AuthError::Storage(AppError::validation(e.to_string()))
            })?;
        let phone = dto
            .phone
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(|e: edulife_models::value_types::ValueTypeError| {
                AuthError::Storage(AppError::validation(e.to_string()))
            })?;

        let password_hash = hash_password(&dto.password)?;
        let user = self
            .store
            .create_user(NewUser {
                email,
                phone,
                password_hash,
                role,
            })
            .await?;

        self.store
            .record_audit(
                NewAuditEntry::new(actions::USER_REGISTERED, "user").entity(user.id.0),
            )
            .await?;
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Verifies credentials and opens a session.
    ///
    /// Failed attempts count toward the lockout policy; a locked or blocked
    /// account is rejected before the password is even checked.
    #[instrument(skip(self, dto))]
    pub async fn authenticate(
        &self,
        dto: LoginDto,
        user_agent: Option<String>,
        ip_address: Option<String>,
    ) -> Result<AuthTokens, AuthError> {
        dto.validate()
            .map_err(|e| AuthError::Storage(AppError::validation(e.to_string())))?;
        let now = Utc::now();

        let user = self
            .store
            .find_user_by_identifier(&dto.identifier)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if let Some(until) = user.locked_until.filter(|_| user.is_locked(now)) {
            return Err(AuthError::AccountLocked { until });
        }
        if user.is_blocked() {
            return Err(AuthError::AccountBlocked);
        }

        if !verify_password(&dto.password, &user.password_hash)? {
            let attempts = user.failed_login_attempts + 1;
            let locked_until = (attempts >= self.security.max_failed_logins)
                .then(|| now + Duration::seconds(self.security.lockout_duration_secs));
            self.store
                .record_login_failure(user.id, locked_until)
                .await?;
            if let Some(until) = locked_until {
                warn!(user_id = %user.id, %until, "account locked after repeated failures");
                self.store
                    .record_audit(NewAuditEntry::new(actions::USER_LOCKED, "user").entity(user.id.0))
                    .await?;
            } else {
                self.store
                    .record_audit(
                        NewAuditEntry::new(actions::USER_LOGIN_FAILED, "user").entity(user.id.0),
                    )
                    .await?;
            }
            return Err(AuthError::InvalidCredentials);
        }

        let user = self.store.record_login_success(user.id, now).await?;
        let session = self
            .store
            .create_session(NewSession {
                user_id: user.id,
                user_agent,
                ip_address,
            })
            .await?;

        let tokens = self.issue_tokens(&user, session.id, now).await?;
        self.store
            .record_audit(
                NewAuditEntry::new(actions::USER_LOGIN, "session")
                    .actor(user.id)
                    .entity(session.id.0),
            )
            .await?;
        Ok(tokens)
    }

    /// Rotates a refresh token: the old token is revoked and blacklisted in
    /// the same write that persists its replacement, so a replayed token is
    /// always rejected.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let claims = verify_refresh_token(refresh_token, &self.jwt).map_err(|e| match e {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid => AuthError::InvalidCredentials,
        })?;
        let now = Utc::now();

        if self.store.is_jti_blacklisted(&claims.jti).await? {
            warn!(jti = %claims.jti, "replay of a blacklisted refresh token");
            return Err(AuthError::TokenBlacklisted);
        }

        let record = self
            .store
            .find_refresh_token_by_jti(&claims.jti)
            .await?
            .ok_or(AuthError::TokenRevoked)?;
        if record.token_hash != hash_token(refresh_token) || record.is_revoked() {
            return Err(AuthError::TokenRevoked);
        }
        if record.is_expired(now) {
            return Err(AuthError::TokenExpired);
        }

        let session = self
            .store
            .find_session(record.session_id)
            .await?
            .ok_or(AuthError::TokenRevoked)?;
        if session.is_revoked() {
            return Err(AuthError::TokenRevoked);
        }

        let user = self
            .store
            .find_user_by_id(record.user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if user.is_blocked() {
            return Err(AuthError::AccountBlocked);
        }

        let jti = Uuid::new_v4().to_string();
        let new_refresh = create_refresh_token(user.id.0, session.id.0, &jti, &self.jwt)?;
        self.store
            .rotate_refresh_token(
                &claims.jti,
                now,
                NewRefreshToken {
                    session_id: session.id,
                    user_id: user.id,
                    jti,
                    token_hash: hash_token(&new_refresh),
                    expires_at: now + Duration::seconds(self.jwt.refresh_token_expiry),
                },
            )
            .await?;

        let access_token = self.access_token_for(&user).await?;
        self.store
            .record_audit(
                NewAuditEntry::new(actions::TOKEN_REFRESHED, "session")
                    .actor(user.id)
                    .entity(session.id.0),
            )
            .await?;
        Ok(AuthTokens {
            access_token,
            refresh_token: new_refresh,
            user,
        })
    }

    /// Revokes the session and every refresh token issued under it.
    #[instrument(skip(self))]
    pub async fn logout(&self, session_id: SessionId) -> Result<(), AuthError> {
        let now = Utc::now();
        let session = self
            .store
            .find_session(session_id)
            .await?
            .ok_or_else(|| AuthError::Storage(AppError::not_found("Session not found")))?;
        self.store.revoke_session(session_id, now).await?;
        self.store
            .record_audit(
                NewAuditEntry::new(actions::USER_LOGOUT, "session")
                    .actor(session.user_id)
                    .entity(session_id.0),
            )
            .await?;
        Ok(())
    }

    async fn issue_tokens(
        &self,
        user: &User,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<AuthTokens, AuthError> {
        let access_token = self.access_token_for(user).await?;

        let jti = Uuid::new_v4().to_string();
        let refresh_token = create_refresh_token(user.id.0, session_id.0, &jti, &self.jwt)?;
        self.store
            .insert_refresh_token(NewRefreshToken {
                session_id,
                user_id: user.id,
                jti,
                token_hash: hash_token(&refresh_token),
                expires_at: now + Duration::seconds(self.jwt.refresh_token_expiry),
            })
            .await?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            user: user.clone(),
        })
    }

    async fn access_token_for(&self, user: &User) -> Result<String, AppError> {
        let permissions = self
            .store
            .permission_slugs_for_role(user.role.as_str())
            .await?;
        create_access_token(
            user.id.0,
            user.email.as_ref().map(|e| e.as_str()),
            user.role.as_str(),
            permissions,
            &self.jwt,
        )
    }
}
