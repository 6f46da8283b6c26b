use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::AppError;
use edulife_models::earnings::{
    EarningStatus, PayoutError, PayoutStatus, TeacherEarning, TeacherPayout,
};
use edulife_models::ids::{EarningId, PayoutId, UserId};

use super::MemoryStore;
use crate::store::ports::PayoutStore;

#[async_trait]
impl PayoutStore for MemoryStore {
    async fn insert_earning(&self, earning: TeacherEarning) -> Result<TeacherEarning, AppError> {
        self.lock().earnings.insert(earning.id, earning.clone());
        Ok(earning)
    }

    async fn find_earnings(&self, ids: &[EarningId]) -> Result<Vec<TeacherEarning>, AppError> {
        let inner = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| inner.earnings.get(id).cloned())
            .collect())
    }

    async fn list_pending_earnings(
        &self,
        teacher_id: UserId,
    ) -> Result<Vec<TeacherEarning>, AppError> {
        let mut earnings: Vec<TeacherEarning> = self
            .lock()
            .earnings
            .values()
            .filter(|e| {
                e.teacher_id == teacher_id
                    && e.status == EarningStatus::Pending
                    && e.payout_id.is_none()
            })
            .cloned()
            .collect();
        earnings.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(earnings)
    }

    async fn create_payout(
        &self,
        payout: TeacherPayout,
        earning_ids: &[EarningId],
    ) -> Result<TeacherPayout, PayoutError> {
        let mut inner = self.lock();

        for id in earning_ids {
            let earning = inner.earnings.get(id).ok_or(PayoutError::EarningNotFound)?;
            if earning.status != EarningStatus::Pending || earning.payout_id.is_some() {
                return Err(PayoutError::EarningAlreadyPaid);
            }
            if earning.teacher_id != payout.teacher_id {
                return Err(PayoutError::MixedTeachers);
            }
        }

        // Reserve only: the paid transition happens at payout completion.
        for id in earning_ids {
            if let Some(earning) = inner.earnings.get_mut(id) {
                earning.payout_id = Some(payout.id);
                earning.updated_at = payout.created_at;
            }
        }
        inner.payouts.insert(payout.id, payout.clone());
        Ok(payout)
    }

    async fn find_payout(&self, id: PayoutId) -> Result<Option<TeacherPayout>, AppError> {
        Ok(self.lock().payouts.get(&id).cloned())
    }

    async fn complete_payout(
        &self,
        id: PayoutId,
        bank_reference: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<TeacherPayout, PayoutError> {
        let mut inner = self.lock();
        let payout = inner.payouts.get_mut(&id).ok_or(PayoutError::PayoutNotFound)?;
        payout.status = PayoutStatus::Completed;
        payout.bank_reference = bank_reference;
        payout.completed_at = Some(now);
        payout.updated_at = now;
        let payout = payout.clone();

        for earning in inner.earnings.values_mut() {
            if earning.payout_id == Some(id) {
                earning.status = EarningStatus::Paid;
                earning.updated_at = now;
            }
        }
        Ok(payout)
    }
}
