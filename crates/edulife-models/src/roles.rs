//! Role and permission models for role-based access control.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use edulife_core::AppError;

use crate::ids::{PermissionId, RoleId};

/// Generate a slug from a name.
///
/// Converts to lowercase, replaces spaces and hyphens with underscores,
/// collapses runs of underscores, and trims them from the ends.
pub fn generate_slug(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c == ' ' || c == '-' {
                '_'
            } else if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut result = String::new();
    let mut prev_underscore = false;
    for c in slug.chars() {
        if c == '_' {
            if !prev_underscore && !result.is_empty() {
                result.push(c);
            }
            prev_underscore = true;
        } else {
            result.push(c);
            prev_underscore = false;
        }
    }

    result.trim_end_matches('_').to_string()
}

/// A named set of permissions.
///
/// The four system roles (`is_system = true`) are seeded by migration and
/// can never be deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: PermissionId,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Join row between roles and permissions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RolePermission {
    pub role_id: RoleId,
    pub permission_id: PermissionId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permission_ids: Vec<PermissionId>,
}

/// Named error kinds for role and permission management.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error("Role not found")]
    RoleNotFound,
    #[error("Permission not found")]
    PermissionNotFound,
    #[error("System roles cannot be modified")]
    SystemRoleImmutable,
    #[error("A role with this slug already exists")]
    DuplicateSlug,
    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::RoleNotFound | AccessError::PermissionNotFound => {
                AppError::not_found(err.to_string())
            }
            AccessError::SystemRoleImmutable | AccessError::DuplicateSlug => {
                AppError::conflict(err.to_string())
            }
            AccessError::Storage(inner) => inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_generation() {
        assert_eq!(generate_slug("Course Editor"), "course_editor");
        assert_eq!(generate_slug("Super--Admin!"), "super_admin");
        assert_eq!(generate_slug("  Weird   Name  "), "weird_name");
    }

    #[test]
    fn system_role_error_is_conflict() {
        let err = AppError::from(AccessError::SystemRoleImmutable);
        assert_eq!(err.status().as_u16(), 409);
    }
}
