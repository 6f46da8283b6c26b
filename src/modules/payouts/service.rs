//! Teacher earnings and payout batches.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use edulife_config::CommerceConfig;
use edulife_core::AppError;
use edulife_models::audit::{actions, NewAuditEntry};
use edulife_models::earnings::{
    EarningKind, EarningStatus, PayoutError, PayoutStatus, TeacherEarning, TeacherPayout,
};
use edulife_models::ids::{EarningId, PayoutId, UserId};

use crate::store::Store;

use super::pool::distribute_pool;

pub struct PayoutService {
    store: Arc<dyn Store>,
    config: CommerceConfig,
}

impl PayoutService {
    pub fn new(store: Arc<dyn Store>, config: CommerceConfig) -> Self {
        Self { store, config }
    }

    /// Splits one billing period's subscription revenue across teachers
    /// by watch time and records a pool earning for each.
    ///
    /// The pool is the revenue of subscriptions active right now; the
    /// platform commission comes off each teacher's gross share.
    #[instrument(skip(self))]
    pub async fn distribute_subscription_pool(
        &self,
        period: &str,
    ) -> Result<Vec<TeacherEarning>, AppError> {
        let now = Utc::now();
        let revenue: i64 = self
            .store
            .active_subscriptions(now)
            .await?
            .iter()
            .map(|s| s.price)
            .sum();
        let weights = self.store.watch_seconds_by_teacher().await?;
        let shares = distribute_pool(revenue, &weights);

        let mut earnings = Vec::with_capacity(shares.len());
        for (teacher_id, gross) in shares {
            let commission = (gross as f64 * self.config.commission_rate).round() as i64;
            let earning = self
                .store
                .insert_earning(TeacherEarning {
                    id: EarningId::new(),
                    teacher_id,
                    kind: EarningKind::SubscriptionPool,
                    course_id: None,
                    period: Some(period.to_string()),
                    payment_id: None,
                    gross_amount: gross,
                    net_amount: gross - commission,
                    status: EarningStatus::Pending,
                    payout_id: None,
                    created_at: now,
                    updated_at: now,
                })
                .await?;
            earnings.push(earning);
        }
        info!(period, teachers = earnings.len(), revenue, "subscription pool distributed");
        Ok(earnings)
    }

    pub async fn list_pending_earnings(
        &self,
        teacher_id: UserId,
    ) -> Result<Vec<TeacherEarning>, AppError> {
        self.store.list_pending_earnings(teacher_id).await
    }

    /// Batches pending earnings into a payout for one teacher.
    #[instrument(skip(self, earning_ids))]
    pub async fn create_payout(
        &self,
        teacher_id: UserId,
        earning_ids: &[EarningId],
    ) -> Result<TeacherPayout, PayoutError> {
        if earning_ids.is_empty() {
            return Err(PayoutError::EmptyPayout);
        }
        let earnings = self.store.find_earnings(earning_ids).await?;
        if earnings.len() != earning_ids.len() {
            return Err(PayoutError::EarningNotFound);
        }
        if earnings.iter().any(|e| e.teacher_id != teacher_id) {
            return Err(PayoutError::MixedTeachers);
        }
        if earnings
            .iter()
            .any(|e| e.status != EarningStatus::Pending || e.payout_id.is_some())
        {
            return Err(PayoutError::EarningAlreadyPaid);
        }

        let gross: i64 = earnings.iter().map(|e| e.net_amount).sum();
        let now = Utc::now();
        let payout = self
            .store
            .create_payout(
                TeacherPayout {
                    id: PayoutId::new(),
                    teacher_id,
                    gross_amount: gross,
                    deductions: 0,
                    net_amount: gross,
                    status: PayoutStatus::Pending,
                    bank_reference: None,
                    created_at: now,
                    completed_at: None,
                    updated_at: now,
                },
                earning_ids,
            )
            .await?;

        self.store
            .record_audit(
                NewAuditEntry::new(actions::PAYOUT_CREATED, "teacher_payout")
                    .actor(teacher_id)
                    .entity(payout.id.0)
                    .detail(format!("earnings={} net={}", earning_ids.len(), payout.net_amount)),
            )
            .await?;
        info!(payout_id = %payout.id, teacher_id = %teacher_id, net = payout.net_amount, "payout created");
        Ok(payout)
    }

    /// Marks a payout as transferred and its earnings as paid.
    #[instrument(skip(self))]
    pub async fn complete_payout(
        &self,
        payout_id: PayoutId,
        bank_reference: Option<String>,
    ) -> Result<TeacherPayout, PayoutError> {
        let payout = self
            .store
            .complete_payout(payout_id, bank_reference, Utc::now())
            .await?;
        self.store
            .record_audit(
                NewAuditEntry::new(actions::PAYOUT_COMPLETED, "teacher_payout")
                    .actor(payout.teacher_id)
                    .entity(payout.id.0),
            )
            .await?;
        Ok(payout)
    }
}
