use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::AppError;
use edulife_models::earnings::{PayoutError, TeacherEarning, TeacherPayout};
use edulife_models::ids::{EarningId, PayoutId, UserId};

/// Teacher earnings and payout batches.
#[async_trait]
pub trait PayoutStore: Send + Sync {
    async fn insert_earning(&self, earning: TeacherEarning) -> Result<TeacherEarning, AppError>;

    async fn find_earnings(&self, ids: &[EarningId]) -> Result<Vec<TeacherEarning>, AppError>;

    async fn list_pending_earnings(
        &self,
        teacher_id: UserId,
    ) -> Result<Vec<TeacherEarning>, AppError>;

    /// Inserts the payout and reserves each earning by stamping the payout
    /// id on it; earnings stay `pending` until the transfer completes.
    /// Re-checks that every earning is still unclaimed inside the same
    /// transaction; fails with [`PayoutError::EarningAlreadyPaid`] if any
    /// was claimed concurrently.
    async fn create_payout(
        &self,
        payout: TeacherPayout,
        earning_ids: &[EarningId],
    ) -> Result<TeacherPayout, PayoutError>;

    async fn find_payout(&self, id: PayoutId) -> Result<Option<TeacherPayout>, AppError>;

    /// Marks the payout completed and flips its reserved earnings to
    /// `paid` in the same write.
    async fn complete_payout(
        &self,
        id: PayoutId,
        bank_reference: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<TeacherPayout, PayoutError>;
}
