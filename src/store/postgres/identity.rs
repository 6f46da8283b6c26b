use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::AppError;
use edulife_models::ids::{PermissionId, RoleId, SessionId, UserId};
use edulife_models::roles::{AccessError, Permission, Role, RoleWithPermissions};
use edulife_models::sessions::{NewRefreshToken, NewSession, RefreshTokenRecord, Session};
use edulife_models::users::{AuthError, NewUser, User};

use super::{is_unique_violation, storage_error, PostgresStore};
use crate::store::ports::{AccessStore, IdentityStore};

#[async_trait]
impl IdentityStore for PostgresStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, phone, password_hash, role, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING *
            "#,
        )
        .bind(new_user.email)
        .bind(new_user.phone)
        .bind(new_user.password_hash)
        .bind(new_user.role)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::IdentifierTaken
            } else {
                AuthError::Storage(storage_error(e))
            }
        })
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(storage_error)
    }

    async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE (email = LOWER(TRIM($1)) OR phone = TRIM($1)) AND deleted_at IS NULL
            "#,
        )
        .bind(identifier)
        .fetch_optional(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn record_login_failure(
        &self,
        user_id: UserId,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET failed_login_attempts = CASE
                    WHEN $2::timestamptz IS NOT NULL THEN 0
                    ELSE failed_login_attempts + 1
                END,
                locked_until = COALESCE($2, locked_until),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(locked_until)
        .fetch_optional(self.pool())
        .await
        .map_err(storage_error)?
        .ok_or_else(|| AppError::not_found("User not found"))
    }

    async fn record_login_success(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET failed_login_attempts = 0,
                locked_until = NULL,
                login_count = login_count + 1,
                last_login_at = $2,
                updated_at = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_optional(self.pool())
        .await
        .map_err(storage_error)?
        .ok_or_else(|| AppError::not_found("User not found"))
    }

    async fn create_session(&self, new_session: NewSession) -> Result<Session, AppError> {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, user_agent, ip_address)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(new_session.user_id)
        .bind(new_session.user_agent)
        .bind(new_session.ip_address)
        .fetch_one(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn find_session(&self, id: SessionId) -> Result<Option<Session>, AppError> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(storage_error)
    }

    async fn insert_refresh_token(
        &self,
        token: NewRefreshToken,
    ) -> Result<RefreshTokenRecord, AppError> {
        sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            INSERT INTO refresh_tokens (session_id, user_id, jti, token_hash, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(token.session_id)
        .bind(token.user_id)
        .bind(token.jti)
        .bind(token.token_hash)
        .bind(token.expires_at)
        .fetch_one(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn find_refresh_token_by_jti(
        &self,
        jti: &str,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        sqlx::query_as::<_, RefreshTokenRecord>("SELECT * FROM refresh_tokens WHERE jti = $1")
            .bind(jti)
            .fetch_optional(self.pool())
            .await
            .map_err(storage_error)
    }

    async fn rotate_refresh_token(
        &self,
        old_jti: &str,
        now: DateTime<Utc>,
        replacement: NewRefreshToken,
    ) -> Result<RefreshTokenRecord, AppError> {
        let mut tx = self.pool().begin().await.map_err(storage_error)?;

        let old: Option<RefreshTokenRecord> = sqlx::query_as::<_, RefreshTokenRecord>(
            "UPDATE refresh_tokens SET revoked_at = $2 WHERE jti = $1 RETURNING *",
        )
        .bind(old_jti)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_error)?;
        let old = old.ok_or_else(|| AppError::not_found("Refresh token not found"))?;

        sqlx::query(
            r#"
            INSERT INTO token_blacklist (jti, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(old_jti)
        .bind(old.expires_at)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            INSERT INTO refresh_tokens (session_id, user_id, jti, token_hash, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(replacement.session_id)
        .bind(replacement.user_id)
        .bind(replacement.jti)
        .bind(replacement.token_hash)
        .bind(replacement.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        Ok(record)
    }

    async fn revoke_session(&self, id: SessionId, now: DateTime<Utc>) -> Result<(), AppError> {
        let mut tx = self.pool().begin().await.map_err(storage_error)?;

        let updated = sqlx::query(
            "UPDATE sessions SET revoked_at = COALESCE(revoked_at, $2) WHERE id = $1",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;
        if updated.rows_affected() == 0 {
            return Err(AppError::not_found("Session not found"));
        }

        sqlx::query(
            r#"
            INSERT INTO token_blacklist (jti, expires_at)
            SELECT jti, expires_at FROM refresh_tokens
            WHERE session_id = $1 AND revoked_at IS NULL
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = $2 WHERE session_id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        Ok(())
    }

    async fn is_jti_blacklisted(&self, jti: &str) -> Result<bool, AppError> {
        let found: Option<(String,)> =
            sqlx::query_as("SELECT jti FROM token_blacklist WHERE jti = $1")
                .bind(jti)
                .fetch_optional(self.pool())
                .await
                .map_err(storage_error)?;
        Ok(found.is_some())
    }
}

impl PostgresStore {
    async fn permissions_for_role(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        role_id: RoleId,
    ) -> Result<Vec<Permission>, AccessError> {
        sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.* FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.slug
            "#,
        )
        .bind(role_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| AccessError::Storage(storage_error(e)))
    }
}

#[async_trait]
impl AccessStore for PostgresStore {
    async fn create_role(
        &self,
        role: Role,
        permission_ids: &[PermissionId],
    ) -> Result<RoleWithPermissions, AccessError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| AccessError::Storage(storage_error(e)))?;

        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (id, name, slug, description, is_system)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING *
            "#,
        )
        .bind(role.id)
        .bind(role.name)
        .bind(role.slug)
        .bind(role.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AccessError::DuplicateSlug
            } else {
                AccessError::Storage(storage_error(e))
            }
        })?;

        let mut permissions = Vec::with_capacity(permission_ids.len());
        for &permission_id in permission_ids {
            let permission = sqlx::query_as::<_, Permission>(
                "SELECT * FROM permissions WHERE id = $1",
            )
            .bind(permission_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AccessError::Storage(storage_error(e)))?
            .ok_or(AccessError::PermissionNotFound)?;

            sqlx::query("INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2)")
                .bind(role.id)
                .bind(permission_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| AccessError::Storage(storage_error(e)))?;
            permissions.push(permission);
        }

        tx.commit()
            .await
            .map_err(|e| AccessError::Storage(storage_error(e)))?;
        Ok(RoleWithPermissions { role, permissions })
    }

    async fn grant_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> Result<RoleWithPermissions, AccessError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| AccessError::Storage(storage_error(e)))?;

        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1 FOR UPDATE")
            .bind(role_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AccessError::Storage(storage_error(e)))?
            .ok_or(AccessError::RoleNotFound)?;
        if role.is_system {
            return Err(AccessError::SystemRoleImmutable);
        }
        sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE id = $1")
            .bind(permission_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AccessError::Storage(storage_error(e)))?
            .ok_or(AccessError::PermissionNotFound)?;

        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AccessError::Storage(storage_error(e)))?;

        let permissions = self.permissions_for_role(&mut tx, role_id).await?;
        tx.commit()
            .await
            .map_err(|e| AccessError::Storage(storage_error(e)))?;
        Ok(RoleWithPermissions { role, permissions })
    }

    async fn revoke_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> Result<RoleWithPermissions, AccessError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| AccessError::Storage(storage_error(e)))?;

        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1 FOR UPDATE")
            .bind(role_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AccessError::Storage(storage_error(e)))?
            .ok_or(AccessError::RoleNotFound)?;
        if role.is_system {
            return Err(AccessError::SystemRoleImmutable);
        }
        sqlx::query_as::<_, Permission>("SELECT * FROM permissions WHERE id = $1")
            .bind(permission_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AccessError::Storage(storage_error(e)))?
            .ok_or(AccessError::PermissionNotFound)?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = $2")
            .bind(role_id)
            .bind(permission_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AccessError::Storage(storage_error(e)))?;

        let permissions = self.permissions_for_role(&mut tx, role_id).await?;
        tx.commit()
            .await
            .map_err(|e| AccessError::Storage(storage_error(e)))?;
        Ok(RoleWithPermissions { role, permissions })
    }

    async fn delete_role(&self, id: RoleId) -> Result<(), AccessError> {
        let role = sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| AccessError::Storage(storage_error(e)))?
            .ok_or(AccessError::RoleNotFound)?;
        if role.is_system {
            return Err(AccessError::SystemRoleImmutable);
        }
        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| AccessError::Storage(storage_error(e)))?;
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles ORDER BY slug")
            .fetch_all(self.pool())
            .await
            .map_err(storage_error)
    }

    async fn find_role_by_slug(&self, slug: &str) -> Result<Option<Role>, AppError> {
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE slug = $1")
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(storage_error)
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        sqlx::query_as::<_, Permission>("SELECT * FROM permissions ORDER BY slug")
            .fetch_all(self.pool())
            .await
            .map_err(storage_error)
    }

    async fn permission_slugs_for_role(&self, role_slug: &str) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT p.slug FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            JOIN roles r ON r.id = rp.role_id
            WHERE r.slug = $1
            ORDER BY p.slug
            "#,
        )
        .bind(role_slug)
        .fetch_all(self.pool())
        .await
        .map_err(storage_error)?;
        Ok(rows.into_iter().map(|(slug,)| slug).collect())
    }
}
