use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::{AppError, PaginationParams};
use edulife_models::enrollments::Enrollment;
use edulife_models::ids::{PaymentId, PromoCodeId, SubscriptionId, UserId};
use edulife_models::payments::{Payment, PaymentError, PaymentOutcome, Subscription};
use edulife_models::promos::{PromoCode, PromoCodeUsage};

/// Everything the completion of one payment writes, applied atomically.
///
/// Exactly one of `enrollment`/`subscription_activation` is set, matching
/// the payment's target.
#[derive(Debug, Clone)]
pub struct CompletedPaymentWrite {
    pub payment_id: PaymentId,
    pub provider_transaction_id: String,
    pub paid_at: DateTime<Utc>,
    pub enrollment: Option<Enrollment>,
    pub subscription_activation: Option<SubscriptionActivation>,
    pub promo_usage: Option<PromoCodeUsage>,
    pub earning: Option<edulife_models::earnings::TeacherEarning>,
}

#[derive(Debug, Clone)]
pub struct SubscriptionActivation {
    pub subscription_id: SubscriptionId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Payments, subscriptions, and promo codes.
#[async_trait]
pub trait CommerceStore: Send + Sync {
    async fn find_promo_by_code(&self, code: &str) -> Result<Option<PromoCode>, AppError>;

    async fn insert_promo(&self, promo: PromoCode) -> Result<PromoCode, AppError>;

    async fn promo_usage_count_for_user(
        &self,
        promo_code_id: PromoCodeId,
        user_id: UserId,
    ) -> Result<i64, AppError>;

    async fn insert_payment(&self, payment: Payment) -> Result<Payment, AppError>;

    async fn find_payment(&self, id: PaymentId) -> Result<Option<Payment>, AppError>;

    /// Backs webhook replay idempotency.
    async fn find_payment_by_provider_tx(
        &self,
        provider_transaction_id: &str,
    ) -> Result<Option<Payment>, AppError>;

    async fn list_payments_for_user(
        &self,
        user_id: UserId,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Payment>, i64), AppError>;

    async fn update_payment_status(
        &self,
        id: PaymentId,
        status: edulife_models::payments::PaymentStatus,
        now: DateTime<Utc>,
    ) -> Result<Payment, PaymentError>;

    /// Applies the completion batch: marks the payment completed, creates
    /// the enrollment or activates the subscription, records the promo
    /// usage and bumps its counter, and inserts the teacher earning.
    /// One transaction. Fails with [`PaymentError::AlreadyEnrolled`] when a
    /// live enrollment for the (user, course) pair already exists.
    async fn apply_payment_completion(
        &self,
        write: CompletedPaymentWrite,
    ) -> Result<PaymentOutcome, PaymentError>;

    /// Marks the payment refunded and records the amount.
    async fn apply_refund(
        &self,
        id: PaymentId,
        refund_amount: i64,
        now: DateTime<Utc>,
    ) -> Result<Payment, PaymentError>;

    async fn insert_subscription(&self, subscription: Subscription)
        -> Result<Subscription, AppError>;

    async fn find_subscription(
        &self,
        id: SubscriptionId,
    ) -> Result<Option<Subscription>, AppError>;

    /// Subscriptions active at `now`, for pool distribution.
    async fn active_subscriptions(&self, now: DateTime<Utc>) -> Result<Vec<Subscription>, AppError>;
}
