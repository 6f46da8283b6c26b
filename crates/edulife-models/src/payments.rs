//! Payment and subscription models.
//!
//! A payment targets exactly one of a course or a subscription. Completion
//! is idempotent on `provider_transaction_id`: replaying a provider webhook
//! returns the original outcome instead of enrolling or activating twice.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use edulife_core::AppError;

use crate::enrollments::Enrollment;
use crate::ids::{CourseId, PaymentId, PromoCodeId, SubscriptionId, UserId};

/// Payment lifecycle, stored as the `payment_status` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
    Cancelled,
}

impl PaymentStatus {
    /// Legal forward transitions. Refunds only follow completion; terminal
    /// states admit nothing further.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Completed)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Cancelled)
                | (Completed, Refunded)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub course_id: Option<CourseId>,
    pub subscription_id: Option<SubscriptionId>,
    /// Amount actually charged, in integer minor units, after discount.
    pub amount: i64,
    pub currency: String,
    pub discount_amount: i64,
    pub promo_code_id: Option<PromoCodeId>,
    pub provider: String,
    pub provider_transaction_id: Option<String>,
    pub status: PaymentStatus,
    pub refund_amount: i64,
    pub refunded_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subscription lifecycle, stored as the `subscription_status` enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Cancelled,
    Expired,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_code: String,
    pub price: i64,
    pub status: SubscriptionStatus,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active
            && self.ends_at.is_none_or(|ends| ends > now)
    }
}

/// What completing a payment produced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Enrolled(Enrollment),
    SubscriptionActivated(Subscription),
}

/// The confirmation received from the payment provider.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCompletion {
    pub payment_id: PaymentId,
    pub provider_transaction_id: String,
}

/// Named error kinds for payment operations.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment not found")]
    PaymentNotFound,
    #[error("Cannot move payment from {from} to {to}")]
    InvalidTransition { from: PaymentStatus, to: PaymentStatus },
    #[error("Refund amount exceeds the amount paid")]
    RefundExceedsAmount,
    #[error("Payment must target a course or a subscription")]
    MissingTarget,
    #[error("User is already enrolled in this course")]
    AlreadyEnrolled,
    #[error(transparent)]
    Storage(#[from] AppError),
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::PaymentNotFound => AppError::not_found(err.to_string()),
            PaymentError::InvalidTransition { .. } | PaymentError::AlreadyEnrolled => {
                AppError::conflict(err.to_string())
            }
            PaymentError::RefundExceedsAmount | PaymentError::MissingTarget => {
                AppError::validation(err.to_string())
            }
            PaymentError::Storage(inner) => inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions() {
        use PaymentStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Completed.can_transition_to(Refunded));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Refunded.can_transition_to(Completed));
        assert!(!Failed.can_transition_to(Completed));
    }
}
