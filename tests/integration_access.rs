mod common;

use common::{memory_store, register_user};
use edulife::modules::access::AccessService;
use edulife_core::permissions;
use edulife_models::roles::{AccessError, CreateRoleDto};
use edulife_models::users::UserRole;

#[tokio::test]
async fn seeded_roles_gate_permissions() {
    let store = memory_store();
    let access = AccessService::new(store.clone());
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;

    access
        .authorize(&student, permissions::TESTS_TAKE)
        .await
        .unwrap();
    assert!(access
        .authorize(&student, permissions::COURSES_CREATE)
        .await
        .is_err());

    access
        .authorize(&teacher, permissions::COURSES_CREATE)
        .await
        .unwrap();
    assert!(access
        .authorize(&teacher, permissions::USERS_DELETE)
        .await
        .is_err());
}

#[tokio::test]
async fn super_admins_bypass_the_permission_table() {
    let store = memory_store();
    let access = AccessService::new(store.clone());
    let root = register_user(&store, "root@example.com", UserRole::SuperAdmin).await;

    // The super_admin role carries no grants; authorization still passes.
    access
        .authorize(&root, permissions::USERS_DELETE)
        .await
        .unwrap();
    access.authorize(&root, "made:up").await.unwrap();
}

#[tokio::test]
async fn custom_roles_carry_their_permissions() {
    let store = memory_store();
    let access = AccessService::new(store.clone());
    let admin = register_user(&store, "admin@example.com", UserRole::Admin).await;

    let all = access.list_permissions().await.unwrap();
    let moderation: Vec<_> = all
        .iter()
        .filter(|p| p.slug == permissions::REVIEWS_MODERATE)
        .map(|p| p.id)
        .collect();

    let created = access
        .create_role(
            &admin,
            CreateRoleDto {
                name: "Review Moderator".into(),
                description: Some("Handles reported reviews".into()),
                permission_ids: moderation,
            },
        )
        .await
        .unwrap();
    assert_eq!(created.role.slug, "review_moderator");
    assert!(!created.role.is_system);
    assert_eq!(created.permissions.len(), 1);

    access.delete_role(&admin, created.role.id).await.unwrap();
}

#[tokio::test]
async fn permissions_can_be_granted_and_revoked() {
    let store = memory_store();
    let access = AccessService::new(store.clone());
    let admin = register_user(&store, "admin@example.com", UserRole::Admin).await;

    let created = access
        .create_role(
            &admin,
            CreateRoleDto {
                name: "Support Agent".into(),
                description: None,
                permission_ids: vec![],
            },
        )
        .await
        .unwrap();
    assert!(created.permissions.is_empty());

    let all = access.list_permissions().await.unwrap();
    let moderate = all
        .iter()
        .find(|p| p.slug == permissions::REVIEWS_MODERATE)
        .unwrap();

    let updated = access
        .grant_permission(&admin, created.role.id, moderate.id)
        .await
        .unwrap();
    assert_eq!(updated.permissions.len(), 1);

    // Granting an already-held permission changes nothing.
    let updated = access
        .grant_permission(&admin, created.role.id, moderate.id)
        .await
        .unwrap();
    assert_eq!(updated.permissions.len(), 1);

    let updated = access
        .revoke_permission(&admin, created.role.id, moderate.id)
        .await
        .unwrap();
    assert!(updated.permissions.is_empty());
}

#[tokio::test]
async fn system_roles_cannot_be_deleted() {
    let store = memory_store();
    let access = AccessService::new(store.clone());
    let admin = register_user(&store, "admin@example.com", UserRole::Admin).await;

    let roles = access.list_roles().await.unwrap();
    let student_role = roles.iter().find(|r| r.slug == "student").unwrap();

    let err = access
        .delete_role(&admin, student_role.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::SystemRoleImmutable));

    // Their permission sets are frozen too.
    let all = access.list_permissions().await.unwrap();
    let err = access
        .grant_permission(&admin, student_role.id, all[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::SystemRoleImmutable));
}
