//! Append-only audit log models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::ids::{AuditId, UserId};

/// Well-known audit action names.
pub mod actions {
    pub const USER_REGISTERED: &str = "user.registered";
    pub const USER_LOGIN: &str = "user.login";
    pub const USER_LOGIN_FAILED: &str = "user.login_failed";
    pub const USER_LOCKED: &str = "user.locked";
    pub const USER_LOGOUT: &str = "user.logout";
    pub const TOKEN_REFRESHED: &str = "token.refreshed";
    pub const ROLE_CREATED: &str = "role.created";
    pub const ROLE_UPDATED: &str = "role.updated";
    pub const ROLE_DELETED: &str = "role.deleted";
    pub const COURSE_CREATED: &str = "course.created";
    pub const COURSE_PUBLISHED: &str = "course.published";
    pub const COURSE_DELETED: &str = "course.deleted";
    pub const ENROLLMENT_CREATED: &str = "enrollment.created";
    pub const ATTEMPT_SUBMITTED: &str = "attempt.submitted";
    pub const PAYMENT_COMPLETED: &str = "payment.completed";
    pub const PAYMENT_REFUNDED: &str = "payment.refunded";
    pub const PROMO_REDEEMED: &str = "promo.redeemed";
    pub const PAYOUT_CREATED: &str = "payout.created";
    pub const PAYOUT_COMPLETED: &str = "payout.completed";
    pub const REVIEW_CREATED: &str = "review.created";
}

/// One immutable row in the audit trail. `actor_id` is `None` for
/// system-initiated actions.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuditEntry {
    pub id: AuditId,
    pub actor_id: Option<UserId>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    /// Free-form JSON detail, serialized as text.
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub actor_id: Option<UserId>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub detail: Option<String>,
}

impl NewAuditEntry {
    pub fn new(action: &str, entity_type: &str) -> Self {
        Self {
            actor_id: None,
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: None,
            detail: None,
        }
    }

    pub fn actor(mut self, actor_id: UserId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn entity(mut self, entity_id: Uuid) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
