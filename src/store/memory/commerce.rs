use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::{AppError, PaginationParams};
use edulife_models::ids::{PaymentId, PromoCodeId, SubscriptionId, UserId};
use edulife_models::payments::{
    Payment, PaymentError, PaymentOutcome, PaymentStatus, Subscription, SubscriptionStatus,
};
use edulife_models::promos::{PromoCode, PromoCodeUsage};

use super::MemoryStore;
use crate::store::ports::{CommerceStore, CompletedPaymentWrite};

#[async_trait]
impl CommerceStore for MemoryStore {
    async fn find_promo_by_code(&self, code: &str) -> Result<Option<PromoCode>, AppError> {
        Ok(self
            .lock()
            .promo_codes
            .values()
            .find(|p| p.code.eq_ignore_ascii_case(code))
            .cloned())
    }

    async fn insert_promo(&self, promo: PromoCode) -> Result<PromoCode, AppError> {
        self.lock().promo_codes.insert(promo.id, promo.clone());
        Ok(promo)
    }

    async fn promo_usage_count_for_user(
        &self,
        promo_code_id: PromoCodeId,
        user_id: UserId,
    ) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .promo_usages
            .values()
            .filter(|u| u.promo_code_id == promo_code_id && u.user_id == user_id)
            .count() as i64)
    }

    async fn insert_payment(&self, payment: Payment) -> Result<Payment, AppError> {
        self.lock().payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn find_payment(&self, id: PaymentId) -> Result<Option<Payment>, AppError> {
        Ok(self.lock().payments.get(&id).cloned())
    }

    async fn find_payment_by_provider_tx(
        &self,
        provider_transaction_id: &str,
    ) -> Result<Option<Payment>, AppError> {
        Ok(self
            .lock()
            .payments
            .values()
            .find(|p| {
                p.provider_transaction_id.as_deref() == Some(provider_transaction_id)
            })
            .cloned())
    }

    async fn list_payments_for_user(
        &self,
        user_id: UserId,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Payment>, i64), AppError> {
        let inner = self.lock();
        let mut payments: Vec<Payment> = inner
            .payments
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = payments.len() as i64;
        let page: Vec<Payment> = payments
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect();
        Ok((page, total))
    }

    async fn update_payment_status(
        &self,
        id: PaymentId,
        status: PaymentStatus,
        now: DateTime<Utc>,
    ) -> Result<Payment, PaymentError> {
        let mut inner = self.lock();
        let payment = inner
            .payments
            .get_mut(&id)
            .ok_or(PaymentError::PaymentNotFound)?;
        if !payment.status.can_transition_to(status) {
            return Err(PaymentError::InvalidTransition {
                from: payment.status,
                to: status,
            });
        }
        payment.status = status;
        payment.updated_at = now;
        Ok(payment.clone())
    }

    async fn apply_payment_completion(
        &self,
        write: CompletedPaymentWrite,
    ) -> Result<PaymentOutcome, PaymentError> {
        let mut inner = self.lock();

        // Validate everything before the first mutation; the completion is
        // all-or-nothing.
        if let Some(enrollment) = &write.enrollment {
            let taken = inner.enrollments.values().any(|e| {
                e.deleted_at.is_none()
                    && e.user_id == enrollment.user_id
                    && e.course_id == enrollment.course_id
            });
            if taken {
                return Err(PaymentError::AlreadyEnrolled);
            }
        }

        let payment = inner
            .payments
            .get_mut(&write.payment_id)
            .ok_or(PaymentError::PaymentNotFound)?;
        if !payment.status.can_transition_to(PaymentStatus::Completed) {
            return Err(PaymentError::InvalidTransition {
                from: payment.status,
                to: PaymentStatus::Completed,
            });
        }
        payment.status = PaymentStatus::Completed;
        payment.provider_transaction_id = Some(write.provider_transaction_id);
        payment.paid_at = Some(write.paid_at);
        payment.updated_at = write.paid_at;

        if let Some(usage) = write.promo_usage {
            let promo_code_id = usage.promo_code_id;
            inner.promo_usages.insert(usage.id, usage);
            if let Some(promo) = inner.promo_codes.get_mut(&promo_code_id) {
                promo.used_count += 1;
                promo.updated_at = write.paid_at;
            }
        }
        if let Some(earning) = write.earning {
            inner.earnings.insert(earning.id, earning);
        }

        if let Some(enrollment) = write.enrollment {
            inner.enrollments.insert(enrollment.id, enrollment.clone());
            if let Some(course) = inner.courses.get_mut(&enrollment.course_id) {
                course.students_count += 1;
                course.updated_at = write.paid_at;
            }
            return Ok(PaymentOutcome::Enrolled(enrollment));
        }
        if let Some(activation) = write.subscription_activation {
            let subscription = inner
                .subscriptions
                .get_mut(&activation.subscription_id)
                .ok_or(PaymentError::MissingTarget)?;
            subscription.status = SubscriptionStatus::Active;
            subscription.starts_at = Some(activation.starts_at);
            subscription.ends_at = Some(activation.ends_at);
            subscription.updated_at = write.paid_at;
            return Ok(PaymentOutcome::SubscriptionActivated(subscription.clone()));
        }
        Err(PaymentError::MissingTarget)
    }

    async fn apply_refund(
        &self,
        id: PaymentId,
        refund_amount: i64,
        now: DateTime<Utc>,
    ) -> Result<Payment, PaymentError> {
        let mut inner = self.lock();
        let payment = inner
            .payments
            .get_mut(&id)
            .ok_or(PaymentError::PaymentNotFound)?;
        if !payment.status.can_transition_to(PaymentStatus::Refunded) {
            return Err(PaymentError::InvalidTransition {
                from: payment.status,
                to: PaymentStatus::Refunded,
            });
        }
        payment.status = PaymentStatus::Refunded;
        payment.refund_amount = refund_amount;
        payment.refunded_at = Some(now);
        payment.updated_at = now;
        Ok(payment.clone())
    }

    async fn insert_subscription(
        &self,
        subscription: Subscription,
    ) -> Result<Subscription, AppError> {
        self.lock()
            .subscriptions
            .insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    async fn find_subscription(
        &self,
        id: SubscriptionId,
    ) -> Result<Option<Subscription>, AppError> {
        Ok(self.lock().subscriptions.get(&id).cloned())
    }

    async fn active_subscriptions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Subscription>, AppError> {
        Ok(self
            .lock()
            .subscriptions
            .values()
            .filter(|s| s.is_active(now))
            .cloned()
            .collect())
    }
}
