use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::AppError;
use edulife_models::ids::{PermissionId, RefreshTokenId, RoleId, SessionId, UserId};
use edulife_models::roles::{AccessError, Permission, Role, RoleWithPermissions};
use edulife_models::sessions::{
    BlacklistEntry, NewRefreshToken, NewSession, RefreshTokenRecord, Session,
};
use edulife_models::users::{AuthError, NewUser, User, UserStatus};

use super::{Inner, MemoryStore};
use crate::store::ports::{AccessStore, IdentityStore};

fn role_with_permissions(inner: &Inner, role: Role) -> RoleWithPermissions {
    let mut permissions: Vec<Permission> = inner
        .role_permissions
        .iter()
        .filter(|rp| rp.role_id == role.id)
        .filter_map(|rp| inner.permissions.get(&rp.permission_id))
        .cloned()
        .collect();
    permissions.sort_by(|a, b| a.slug.cmp(&b.slug));
    RoleWithPermissions { role, permissions }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        let now = Utc::now();
        let mut inner = self.lock();

        let email = new_user.email.as_ref().map(|e| e.as_str().to_string());
        let phone = new_user.phone.as_ref().map(|p| p.as_str().to_string());
        let taken = inner.users.values().any(|u| {
            u.deleted_at.is_none()
                && (email.is_some()
                    && u.email.as_ref().map(|e| e.as_str().to_string()) == email
                    || phone.is_some()
                        && u.phone.as_ref().map(|p| p.as_str().to_string()) == phone)
        });
        if taken {
            return Err(AuthError::IdentifierTaken);
        }

        let user = User {
            id: UserId::new(),
            email: new_user.email,
            phone: new_user.phone,
            password_hash: new_user.password_hash,
            role: new_user.role,
            status: UserStatus::Pending,
            email_verified_at: None,
            phone_verified_at: None,
            failed_login_attempts: 0,
            locked_until: None,
            login_count: 0,
            last_login_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        let inner = self.lock();
        Ok(inner.users.get(&id).filter(|u| u.deleted_at.is_none()).cloned())
    }

    async fn find_user_by_identifier(&self, identifier: &str) -> Result<Option<User>, AppError> {
        let needle = identifier.trim().to_lowercase();
        let inner = self.lock();
        Ok(inner
            .users
            .values()
            .find(|u| {
                u.deleted_at.is_none()
                    && (u.email.as_ref().is_some_and(|e| e.as_str() == needle)
                        || u.phone.as_ref().is_some_and(|p| p.as_str() == identifier.trim()))
            })
            .cloned())
    }

    async fn record_login_failure(
        &self,
        user_id: UserId,
        locked_until: Option<DateTime<Utc>>,
    ) -> Result<User, AppError> {
        let mut inner = self.lock();
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        // Applying the lock resets the counter, so the next window starts
        // fresh once the lock expires.
        match locked_until {
            Some(until) => {
                user.failed_login_attempts = 0;
                user.locked_until = Some(until);
            }
            None => user.failed_login_attempts += 1,
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn record_login_success(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<User, AppError> {
        let mut inner = self.lock();
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found("User not found"))?;
        user.failed_login_attempts = 0;
        user.locked_until = None;
        user.login_count += 1;
        user.last_login_at = Some(now);
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn create_session(&self, new_session: NewSession) -> Result<Session, AppError> {
        let session = Session {
            id: SessionId::new(),
            user_id: new_session.user_id,
            user_agent: new_session.user_agent,
            ip_address: new_session.ip_address,
            created_at: Utc::now(),
            revoked_at: None,
        };
        self.lock().sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: SessionId) -> Result<Option<Session>, AppError> {
        Ok(self.lock().sessions.get(&id).cloned())
    }

    async fn insert_refresh_token(
        &self,
        token: NewRefreshToken,
    ) -> Result<RefreshTokenRecord, AppError> {
        let record = RefreshTokenRecord {
            id: RefreshTokenId::new(),
            session_id: token.session_id,
            user_id: token.user_id,
            jti: token.jti,
            token_hash: token.token_hash,
            expires_at: token.expires_at,
            revoked_at: None,
            created_at: Utc::now(),
        };
        self.lock().refresh_tokens.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_refresh_token_by_jti(
        &self,
        jti: &str,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        Ok(self
            .lock()
            .refresh_tokens
            .values()
            .find(|t| t.jti == jti)
            .cloned())
    }

    async fn rotate_refresh_token(
        &self,
        old_jti: &str,
        now: DateTime<Utc>,
        replacement: NewRefreshToken,
    ) -> Result<RefreshTokenRecord, AppError> {
        let mut inner = self.lock();

        let mut old_expires_at = None;
        for token in inner.refresh_tokens.values_mut() {
            if token.jti == old_jti {
                token.revoked_at = Some(now);
                old_expires_at = Some(token.expires_at);
            }
        }
        let expires_at =
            old_expires_at.ok_or_else(|| AppError::not_found("Refresh token not found"))?;
        inner.blacklist.insert(
            old_jti.to_string(),
            BlacklistEntry {
                jti: old_jti.to_string(),
                expires_at,
                created_at: now,
            },
        );

        let record = RefreshTokenRecord {
            id: RefreshTokenId::new(),
            session_id: replacement.session_id,
            user_id: replacement.user_id,
            jti: replacement.jti,
            token_hash: replacement.token_hash,
            expires_at: replacement.expires_at,
            revoked_at: None,
            created_at: now,
        };
        inner.refresh_tokens.insert(record.id, record.clone());
        Ok(record)
    }

    async fn revoke_session(&self, id: SessionId, now: DateTime<Utc>) -> Result<(), AppError> {
        let mut inner = self.lock();

        let session = inner
            .sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Session not found"))?;
        if session.revoked_at.is_none() {
            session.revoked_at = Some(now);
        }

        let mut blacklisted = Vec::new();
        for token in inner.refresh_tokens.values_mut() {
            if token.session_id == id && token.revoked_at.is_none() {
                token.revoked_at = Some(now);
                blacklisted.push((token.jti.clone(), token.expires_at));
            }
        }
        for (jti, expires_at) in blacklisted {
            inner.blacklist.insert(
                jti.clone(),
                BlacklistEntry {
                    jti,
                    expires_at,
                    created_at: now,
                },
            );
        }
        Ok(())
    }

    async fn is_jti_blacklisted(&self, jti: &str) -> Result<bool, AppError> {
        Ok(self.lock().blacklist.contains_key(jti))
    }
}

#[async_trait]
impl AccessStore for MemoryStore {
    async fn create_role(
        &self,
        role: Role,
        permission_ids: &[PermissionId],
    ) -> Result<RoleWithPermissions, AccessError> {
        let mut inner = self.lock();

        if inner.roles.values().any(|r| r.slug == role.slug) {
            return Err(AccessError::DuplicateSlug);
        }
        let mut permissions = Vec::with_capacity(permission_ids.len());
        for &permission_id in permission_ids {
            let permission = inner
                .permissions
                .get(&permission_id)
                .ok_or(AccessError::PermissionNotFound)?;
            permissions.push(permission.clone());
        }

        for &permission_id in permission_ids {
            inner
                .role_permissions
                .push(edulife_models::roles::RolePermission {
                    role_id: role.id,
                    permission_id,
                    created_at: role.created_at,
                });
        }
        inner.roles.insert(role.id, role.clone());
        Ok(RoleWithPermissions { role, permissions })
    }

    async fn grant_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> Result<RoleWithPermissions, AccessError> {
        let mut inner = self.lock();
        let role = inner
            .roles
            .get(&role_id)
            .ok_or(AccessError::RoleNotFound)?
            .clone();
        if role.is_system {
            return Err(AccessError::SystemRoleImmutable);
        }
        if !inner.permissions.contains_key(&permission_id) {
            return Err(AccessError::PermissionNotFound);
        }
        let held = inner
            .role_permissions
            .iter()
            .any(|rp| rp.role_id == role_id && rp.permission_id == permission_id);
        if !held {
            inner
                .role_permissions
                .push(edulife_models::roles::RolePermission {
                    role_id,
                    permission_id,
                    created_at: Utc::now(),
                });
        }
        Ok(role_with_permissions(&inner, role))
    }

    async fn revoke_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> Result<RoleWithPermissions, AccessError> {
        let mut inner = self.lock();
        let role = inner
            .roles
            .get(&role_id)
            .ok_or(AccessError::RoleNotFound)?
            .clone();
        if role.is_system {
            return Err(AccessError::SystemRoleImmutable);
        }
        if !inner.permissions.contains_key(&permission_id) {
            return Err(AccessError::PermissionNotFound);
        }
        inner
            .role_permissions
            .retain(|rp| !(rp.role_id == role_id && rp.permission_id == permission_id));
        Ok(role_with_permissions(&inner, role))
    }

    async fn delete_role(&self, id: RoleId) -> Result<(), AccessError> {
        let mut inner = self.lock();
        let role = inner.roles.get(&id).ok_or(AccessError::RoleNotFound)?;
        if role.is_system {
            return Err(AccessError::SystemRoleImmutable);
        }
        inner.roles.remove(&id);
        inner.role_permissions.retain(|rp| rp.role_id != id);
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let mut roles: Vec<Role> = self.lock().roles.values().cloned().collect();
        roles.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(roles)
    }

    async fn find_role_by_slug(&self, slug: &str) -> Result<Option<Role>, AppError> {
        Ok(self.lock().roles.values().find(|r| r.slug == slug).cloned())
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        let mut permissions: Vec<Permission> =
            self.lock().permissions.values().cloned().collect();
        permissions.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(permissions)
    }

    async fn permission_slugs_for_role(&self, role_slug: &str) -> Result<Vec<String>, AppError> {
        let inner = self.lock();
        let Some(role) = inner.roles.values().find(|r| r.slug == role_slug) else {
            return Ok(Vec::new());
        };
        let mut slugs: Vec<String> = inner
            .role_permissions
            .iter()
            .filter(|rp| rp.role_id == role.id)
            .filter_map(|rp| inner.permissions.get(&rp.permission_id))
            .map(|p| p.slug.clone())
            .collect();
        slugs.sort();
        Ok(slugs)
    }
}
