//! Role management and permission checks.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use edulife_core::AppError;
use edulife_models::audit::{actions, NewAuditEntry};
use edulife_models::ids::{PermissionId, RoleId};
use edulife_models::roles::{
    generate_slug, AccessError, CreateRoleDto, Permission, Role, RoleWithPermissions,
};
use edulife_models::users::{User, UserRole};

use crate::store::Store;

pub struct AccessService {
    store: Arc<dyn Store>,
}

impl AccessService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Permission check. Super admins bypass the permission table entirely.
    pub async fn authorize(&self, user: &User, permission: &str) -> Result<(), AppError> {
        if user.role == UserRole::SuperAdmin {
            return Ok(());
        }
        let slugs = self
            .store
            .permission_slugs_for_role(user.role.as_str())
            .await?;
        if slugs.iter().any(|slug| slug == permission) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "Missing permission: {}",
                permission
            )))
        }
    }

    #[instrument(skip(self, dto))]
    pub async fn create_role(
        &self,
        actor: &User,
        dto: CreateRoleDto,
    ) -> Result<RoleWithPermissions, AccessError> {
        dto.validate()
            .map_err(|e| AccessError::Storage(AppError::validation(e.to_string())))?;
        let now = Utc::now();

        let role = Role {
            id: RoleId::new(),
            slug: generate_slug(&dto.name),
            name: dto.name,
            description: dto.description,
            is_system: false,
            created_at: now,
            updated_at: now,
        };
        let created = self.store.create_role(role, &dto.permission_ids).await?;

        self.store
            .record_audit(
                NewAuditEntry::new(actions::ROLE_CREATED, "role")
                    .actor(actor.id)
                    .entity(created.role.id.0),
            )
            .await?;
        info!(slug = %created.role.slug, "role created");
        Ok(created)
    }

    /// Adds a permission to a custom role. System roles are immutable.
    #[instrument(skip(self))]
    pub async fn grant_permission(
        &self,
        actor: &User,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> Result<RoleWithPermissions, AccessError> {
        let updated = self.store.grant_permission(role_id, permission_id).await?;
        self.store
            .record_audit(
                NewAuditEntry::new(actions::ROLE_UPDATED, "role")
                    .actor(actor.id)
                    .entity(role_id.0)
                    .detail(format!("granted={}", permission_id.0)),
            )
            .await?;
        info!(slug = %updated.role.slug, "permission granted");
        Ok(updated)
    }

    /// Removes a permission from a custom role. System roles are immutable.
    #[instrument(skip(self))]
    pub async fn revoke_permission(
        &self,
        actor: &User,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> Result<RoleWithPermissions, AccessError> {
        let updated = self.store.revoke_permission(role_id, permission_id).await?;
        self.store
            .record_audit(
                NewAuditEntry::new(actions::ROLE_UPDATED, "role")
                    .actor(actor.id)
                    .entity(role_id.0)
                    .detail(format!("revoked={}", permission_id.0)),
            )
            .await?;
        info!(slug = %updated.role.slug, "permission revoked");
        Ok(updated)
    }

    /// System roles can never be deleted.
    #[instrument(skip(self))]
    pub async fn delete_role(&self, actor: &User, id: RoleId) -> Result<(), AccessError> {
        self.store.delete_role(id).await?;
        self.store
            .record_audit(
                NewAuditEntry::new(actions::ROLE_DELETED, "role")
                    .actor(actor.id)
                    .entity(id.0),
            )
            .await?;
        Ok(())
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        self.store.list_roles().await
    }

    pub async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        self.store.list_permissions().await
    }
}
