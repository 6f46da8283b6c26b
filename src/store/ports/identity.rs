use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::AppError;
use edulife_models::ids::{RoleId, SessionId, UserId};
use edulife_models::roles::{AccessError, Permission, Role, RoleWithPermissions};
use edulife_models::sessions::{NewRefreshToken, NewSession, RefreshTokenRecord, Session};
use edulife_models::users::{AuthError, NewUser, User};

/// Users, sessions, and the refresh-token lifecycle.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Fails with [`AuthError::IdentifierTaken`] when the email or phone
    /// already belongs to a live account.
    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, AppError>;

    /// Looks up by email or phone; soft-deleted accounts are invisible.
    async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, AppError>;

    /// Increments the failure counter, or, when `locked_until` is given,
    /// applies the lockout and resets the counter in the same write.
    async fn record_login_failure(
        &self,
        user_id: UserId,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<User, AppError>;

    /// Clears failure state and bumps the login counters.
    async fn record_login_success(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<User, AppError>;

    async fn create_session(&self, new_session: NewSession) -> Result<Session, AppError>;

    async fn find_session(&self, id: SessionId) -> Result<Option<Session>, AppError>;

    async fn insert_refresh_token(
        &self,
        token: NewRefreshToken,
    ) -> Result<RefreshTokenRecord, AppError>;

    async fn find_refresh_token_by_jti(
        &self,
        jti: &str,
    ) -> Result<Option<RefreshTokenRecord>, AppError>;

    /// Atomic rotation: revokes and blacklists the old token, inserts the
    /// replacement.
    async fn rotate_refresh_token(
        &self,
        old_jti: &str,
        now: DateTime<Utc>,
        replacement: NewRefreshToken,
    ) -> Result<RefreshTokenRecord, AppError>;

    /// Atomic logout cascade: revokes the session, revokes every live
    /// refresh token in it, and blacklists their `jti`s.
    async fn revoke_session(&self, id: SessionId, now: DateTime<Utc>) -> Result<(), AppError>;

    async fn is_jti_blacklisted(&self, jti: &str) -> Result<bool, AppError>;
}

/// Roles and permissions.
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Fails with [`AccessError::DuplicateSlug`] on slug collision and
    /// [`AccessError::PermissionNotFound`] for unknown permission ids.
    async fn create_role(
        &self,
        role: Role,
        permission_ids: &[edulife_models::ids::PermissionId],
    ) -> Result<RoleWithPermissions, AccessError>;

    /// Attaches a permission to a non-system role. Granting a permission
    /// the role already holds is a no-op.
    async fn grant_permission(
        &self,
        role_id: RoleId,
        permission_id: edulife_models::ids::PermissionId,
    ) -> Result<RoleWithPermissions, AccessError>;

    /// Detaches a permission from a non-system role.
    async fn revoke_permission(
        &self,
        role_id: RoleId,
        permission_id: edulife_models::ids::PermissionId,
    ) -> Result<RoleWithPermissions, AccessError>;

    /// Fails with [`AccessError::SystemRoleImmutable`] for system roles.
    async fn delete_role(&self, id: RoleId) -> Result<(), AccessError>;

    async fn list_roles(&self) -> Result<Vec<Role>, AppError>;

    async fn find_role_by_slug(&self, slug: &str) -> Result<Option<Role>, AppError>;

    async fn list_permissions(&self) -> Result<Vec<Permission>, AppError>;

    async fn permission_slugs_for_role(&self, role_slug: &str) -> Result<Vec<String>, AppError>;
}
