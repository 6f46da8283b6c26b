//! Teacher earnings and payout models.
//!
//! An earning records the teacher's share of one revenue event. Course-sale
//! earnings reference the course and payment; subscription-pool earnings
//! reference a billing period instead. Exactly one of `course_id`/`period`
//! is set, enforced by a table CHECK.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use edulife_core::AppError;

use crate::ids::{CourseId, EarningId, PaymentId, PayoutId, UserId};

/// Earning origin, stored as the `earning_kind` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "earning_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EarningKind {
    CourseSale,
    SubscriptionPool,
}

/// Earning settlement state, stored as the `earning_status` enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "earning_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EarningStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TeacherEarning {
    pub id: EarningId,
    pub teacher_id: UserId,
    pub kind: EarningKind,
    pub course_id: Option<CourseId>,
    /// Billing period like `2026-08` for subscription-pool earnings.
    pub period: Option<String>,
    pub payment_id: Option<PaymentId>,
    /// Revenue before the platform commission, in minor units.
    pub gross_amount: i64,
    /// The teacher's share after commission, in minor units.
    pub net_amount: i64,
    pub status: EarningStatus,
    pub payout_id: Option<PayoutId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEarning {
    pub teacher_id: UserId,
    pub kind: EarningKind,
    pub course_id: Option<CourseId>,
    pub period: Option<String>,
    pub payment_id: Option<PaymentId>,
    pub gross_amount: i64,
    pub net_amount: i64,
}

/// Payout lifecycle, stored as the `payout_status` enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "payout_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// A batch of earnings paid to one teacher in one transfer.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TeacherPayout {
    pub id: PayoutId,
    pub teacher_id: UserId,
    /// Sum of the included earnings' net amounts, in minor units.
    pub gross_amount: i64,
    pub deductions: i64,
    pub net_amount: i64,
    pub status: PayoutStatus,
    pub bank_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Named error kinds for earnings and payout operations.
#[derive(Debug, thiserror::Error)]
pub enum PayoutError {
    #[error("Earning not found")]
    EarningNotFound,
    #[error("Earning is already included in a payout")]
    EarningAlreadyPaid,
    #[error("Payout must include at least one earning")]
    EmptyPayout,
    #[error("Payout earnings must all belong to the same teacher")]
    MixedTeachers,
    #[error("Payout not found")]
    PayoutNotFound,
    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<PayoutError> for AppError {
    fn from(err: PayoutError) -> Self {
        match err {
            PayoutError::EarningNotFound | PayoutError::PayoutNotFound => {
                AppError::not_found(err.to_string())
            }
            PayoutError::EarningAlreadyPaid => AppError::conflict(err.to_string()),
            PayoutError::EmptyPayout | PayoutError::MixedTeachers => {
                AppError::validation(err.to_string())
            }
            PayoutError::Storage(inner) => inner,
        }
    }
}
