//! User domain models, DTOs, and authentication error kinds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use edulife_core::AppError;

use crate::ids::UserId;
use crate::value_types::{Email, PhoneNumber};

/// The four platform roles, stored as the `user_role` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student,
    Teacher,
    Admin,
    SuperAdmin,
}

impl UserRole {
    /// The slug used in JWT claims and the `roles.slug` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "teacher" => Ok(Self::Teacher),
            "admin" => Ok(Self::Admin),
            "super_admin" => Ok(Self::SuperAdmin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Account lifecycle status, stored as the `user_status` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "user_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Pending,
    Active,
    Blocked,
    Deleted,
}

/// A platform user.
///
/// At least one of `email`/`phone` is present (enforced at registration and
/// by a table CHECK); each is unique among live accounts. Accounts are
/// soft-deleted (`deleted_at`) and never hard-removed while referenced.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Option<Email>,
    pub phone: Option<PhoneNumber>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub phone_verified_at: Option<DateTime<Utc>>,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
    pub login_count: i64,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Whether the account is currently locked out.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| until > now)
    }

    /// Blocked and soft-deleted accounts may not authenticate.
    pub fn is_blocked(&self) -> bool {
        matches!(self.status, UserStatus::Blocked | UserStatus::Deleted)
            || self.deleted_at.is_some()
    }
}

/// Fields needed to insert a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Option<Email>,
    pub phone: Option<PhoneNumber>,
    pub password_hash: String,
    pub role: UserRole,
}

/// Registration request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterDto {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 7, max = 16))]
    pub phone: Option<String>,
    #[validate(length(min = 8))]
    pub password: String,
}

/// Login request; `identifier` is an email address or phone number.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginDto {
    #[validate(length(min = 1))]
    pub identifier: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Successful authentication result.
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Named error kinds for authentication and the token lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account is locked until {until}")]
    AccountLocked { until: DateTime<Utc> },
    #[error("Account is blocked")]
    AccountBlocked,
    #[error("Email or phone is already registered")]
    IdentifierTaken,
    #[error("An email address or phone number is required")]
    MissingIdentifier,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Token has been revoked")]
    TokenRevoked,
    #[error("Token has been blacklisted")]
    TokenBlacklisted,
    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::TokenExpired
            | AuthError::TokenRevoked
            | AuthError::TokenBlacklisted => AppError::unauthorized(err.to_string()),
            AuthError::AccountLocked { .. } | AuthError::AccountBlocked => {
                AppError::forbidden(err.to_string())
            }
            AuthError::IdentifierTaken => AppError::conflict(err.to_string()),
            AuthError::MissingIdentifier => AppError::validation(err.to_string()),
            AuthError::Storage(inner) => inner,
        }
    }
}
