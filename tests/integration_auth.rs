mod common;

use common::{auth_service, jwt_config, memory_store, register_user, TEST_PASSWORD};
use edulife::modules::auth::AuthService;
use edulife_auth::jwt::verify_refresh_token;
use edulife_config::SecurityConfig;
use edulife_core::PaginationParams;
use edulife_models::audit::actions;
use edulife_models::ids::SessionId;
use edulife_models::users::{AuthError, LoginDto, RegisterDto, UserRole, UserStatus};

fn login(identifier: &str, password: &str) -> LoginDto {
    LoginDto {
        identifier: identifier.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn login_succeeds_with_correct_password() {
    let store = memory_store();
    let auth = auth_service(store.clone());
    let user = register_user(&store, "student@example.com", UserRole::Student).await;

    let tokens = auth
        .authenticate(login("student@example.com", TEST_PASSWORD), None, None)
        .await
        .unwrap();
    assert_eq!(tokens.user.id, user.id);
    assert!(!tokens.access_token.is_empty());
    assert!(!tokens.refresh_token.is_empty());
}

#[tokio::test]
async fn login_fails_with_wrong_password() {
    let store = memory_store();
    let auth = auth_service(store.clone());
    register_user(&store, "student@example.com", UserRole::Student).await;

    let err = auth
        .authenticate(login("student@example.com", "wrong-password"), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let store = memory_store();
    let auth = auth_service(store.clone());
    register_user(&store, "taken@example.com", UserRole::Student).await;

    let err = auth
        .register(
            RegisterDto {
                email: Some("taken@example.com".into()),
                phone: None,
                password: TEST_PASSWORD.into(),
            },
            UserRole::Student,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::IdentifierTaken));
}

#[tokio::test]
async fn account_locks_after_repeated_failures() {
    let store = memory_store();
    register_user(&store, "student@example.com", UserRole::Student).await;
    let auth = AuthService::new(
        store.clone(),
        jwt_config(),
        SecurityConfig {
            max_failed_logins: 2,
            lockout_duration_secs: 900,
        },
    );

    for _ in 0..2 {
        let err = auth
            .authenticate(login("student@example.com", "wrong"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    // Correct password no longer helps while locked.
    let err = auth
        .authenticate(login("student@example.com", TEST_PASSWORD), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::AccountLocked { .. }));

    let (entries, _) = store
        .list_audit(Some(actions::USER_LOCKED), None, &PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn registration_leaves_the_account_pending() {
    let store = memory_store();
    let user = register_user(&store, "student@example.com", UserRole::Student).await;
    assert_eq!(user.status, UserStatus::Pending);

    // Pending accounts may still authenticate; only blocked and deleted
    // accounts are turned away.
    auth_service(store.clone())
        .authenticate(login("student@example.com", TEST_PASSWORD), None, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn locking_resets_the_failure_counter() {
    let store = memory_store();
    let user = register_user(&store, "student@example.com", UserRole::Student).await;
    let auth = AuthService::new(
        store.clone(),
        jwt_config(),
        SecurityConfig {
            max_failed_logins: 2,
            lockout_duration_secs: 900,
        },
    );

    for _ in 0..2 {
        auth.authenticate(login("student@example.com", "wrong"), None, None)
            .await
            .unwrap_err();
    }

    // The lock starts a fresh window: one failure after expiry must not
    // re-lock immediately.
    let locked = store.find_user_by_id(user.id).await.unwrap().unwrap();
    assert!(locked.locked_until.is_some());
    assert_eq!(locked.failed_login_attempts, 0);
}

#[tokio::test]
async fn refresh_rotates_and_replay_is_rejected() {
    let store = memory_store();
    let auth = auth_service(store.clone());
    register_user(&store, "student@example.com", UserRole::Student).await;

    let tokens = auth
        .authenticate(login("student@example.com", TEST_PASSWORD), None, None)
        .await
        .unwrap();

    let rotated = auth.refresh(&tokens.refresh_token).await.unwrap();
    assert_ne!(rotated.refresh_token, tokens.refresh_token);

    // The old token's jti is blacklisted by the rotation.
    let err = auth.refresh(&tokens.refresh_token).await.unwrap_err();
    assert!(matches!(err, AuthError::TokenBlacklisted));

    // The replacement still works.
    auth.refresh(&rotated.refresh_token).await.unwrap();
}

#[tokio::test]
async fn logout_revokes_the_whole_session() {
    let store = memory_store();
    let auth = auth_service(store.clone());
    register_user(&store, "student@example.com", UserRole::Student).await;

    let tokens = auth
        .authenticate(login("student@example.com", TEST_PASSWORD), None, None)
        .await
        .unwrap();
    let claims = verify_refresh_token(&tokens.refresh_token, &jwt_config()).unwrap();

    auth.logout(SessionId::from_uuid(claims.session_id))
        .await
        .unwrap();

    let err = auth.refresh(&tokens.refresh_token).await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::TokenRevoked | AuthError::TokenBlacklisted
    ));
}
