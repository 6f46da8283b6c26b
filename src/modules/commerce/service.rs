//! Payments, subscriptions, and promo codes.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};
use validator::Validate;

use edulife_config::CommerceConfig;
use edulife_core::{AppError, PaginationParams};
use edulife_models::audit::{actions, NewAuditEntry};
use edulife_models::courses::CourseStatus;
use edulife_models::earnings::{EarningKind, EarningStatus, TeacherEarning};
use edulife_models::enrollments::Enrollment;
use edulife_models::ids::{
    CourseId, EarningId, EnrollmentId, PaymentId, PromoCodeId, PromoUsageId, SubscriptionId,
    UserId,
};
use edulife_models::payments::{
    Payment, PaymentCompletion, PaymentError, PaymentOutcome, PaymentStatus, Subscription,
    SubscriptionStatus,
};
use edulife_models::promos::{CreatePromoDto, Discount, PromoCode, PromoCodeUsage, PromoError};

use crate::store::{CompletedPaymentWrite, Store, SubscriptionActivation};

use super::promo::evaluate_promo;

/// Length of one paid subscription period.
const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

pub struct CommerceService {
    store: Arc<dyn Store>,
    config: CommerceConfig,
}

impl CommerceService {
    pub fn new(store: Arc<dyn Store>, config: CommerceConfig) -> Self {
        Self { store, config }
    }

    #[instrument(skip(self, dto))]
    pub async fn create_promo(&self, dto: CreatePromoDto) -> Result<PromoCode, AppError> {
        dto.validate()
            .map_err(|e| AppError::validation(e.to_string()))?;
        let now = Utc::now();
        self.store
            .insert_promo(PromoCode {
                id: PromoCodeId::new(),
                code: dto.code.trim().to_uppercase(),
                discount_type: dto.discount_type,
                discount_value: dto.discount_value,
                max_discount: dto.max_discount,
                min_purchase: dto.min_purchase,
                usage_limit: dto.usage_limit,
                usage_per_user: dto.usage_per_user,
                used_count: 0,
                valid_from: dto.valid_from,
                valid_until: dto.valid_until,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    async fn resolve_discount(
        &self,
        user_id: UserId,
        code: &str,
        basket_amount: i64,
    ) -> Result<Discount, PromoError> {
        let promo = self
            .store
            .find_promo_by_code(&code.trim().to_uppercase())
            .await?
            .ok_or(PromoError::PromoNotFound)?;
        let used = self
            .store
            .promo_usage_count_for_user(promo.id, user_id)
            .await?;
        evaluate_promo(&promo, used, basket_amount, Utc::now())
    }

    /// Opens a pending payment for a course purchase, applying an optional
    /// promo code against the course price.
    #[instrument(skip(self))]
    pub async fn create_course_payment(
        &self,
        user_id: UserId,
        course_id: CourseId,
        provider: &str,
        promo_code: Option<&str>,
    ) -> Result<Payment, AppError> {
        let course = self
            .store
            .find_course(course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course not found"))?;
        if course.status != CourseStatus::Published {
            return Err(AppError::validation("Course is not published"));
        }
        if self
            .store
            .find_enrollment(user_id, course_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("User is already enrolled in this course"));
        }

        let discount = match promo_code {
            Some(code) => Some(self.resolve_discount(user_id, code, course.price).await?),
            None => None,
        };
        let discount_amount = discount.map(|d| d.amount).unwrap_or(0);

        let now = Utc::now();
        self.store
            .insert_payment(Payment {
                id: PaymentId::new(),
                user_id,
                course_id: Some(course_id),
                subscription_id: None,
                amount: course.price - discount_amount,
                currency: "USD".into(),
                discount_amount,
                promo_code_id: discount.map(|d| d.promo_code_id),
                provider: provider.to_string(),
                provider_transaction_id: None,
                status: PaymentStatus::Pending,
                refund_amount: 0,
                refunded_at: None,
                paid_at: None,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    /// Creates a pending subscription and opens its payment in one call.
    #[instrument(skip(self))]
    pub async fn create_subscription_payment(
        &self,
        user_id: UserId,
        plan_code: &str,
        price: i64,
        provider: &str,
        promo_code: Option<&str>,
    ) -> Result<(Subscription, Payment), AppError> {
        if price <= 0 {
            return Err(AppError::validation("Subscription price must be positive"));
        }
        let discount = match promo_code {
            Some(code) => Some(self.resolve_discount(user_id, code, price).await?),
            None => None,
        };
        let discount_amount = discount.map(|d| d.amount).unwrap_or(0);

        let now = Utc::now();
        let subscription = self
            .store
            .insert_subscription(Subscription {
                id: SubscriptionId::new(),
                user_id,
                plan_code: plan_code.to_string(),
                price,
                status: SubscriptionStatus::Pending,
                starts_at: None,
                ends_at: None,
                cancelled_at: None,
                created_at: now,
                updated_at: now,
            })
            .await?;
        let payment = self
            .store
            .insert_payment(Payment {
                id: PaymentId::new(),
                user_id,
                course_id: None,
                subscription_id: Some(subscription.id),
                amount: price - discount_amount,
                currency: "USD".into(),
                discount_amount,
                promo_code_id: discount.map(|d| d.promo_code_id),
                provider: provider.to_string(),
                provider_transaction_id: None,
                status: PaymentStatus::Pending,
                refund_amount: 0,
                refunded_at: None,
                paid_at: None,
                created_at: now,
                updated_at: now,
            })
            .await?;
        Ok((subscription, payment))
    }

    /// Completes a payment from a provider confirmation.
    ///
    /// Idempotent on `provider_transaction_id`: a replayed confirmation
    /// returns the original outcome without writing anything.
    #[instrument(skip(self))]
    pub async fn complete_payment(
        &self,
        completion: PaymentCompletion,
    ) -> Result<PaymentOutcome, PaymentError> {
        if let Some(existing) = self
            .store
            .find_payment_by_provider_tx(&completion.provider_transaction_id)
            .await?
        {
            if existing.status == PaymentStatus::Completed {
                warn!(payment_id = %existing.id, "replayed payment confirmation");
                return self.outcome_of(&existing).await;
            }
        }

        let payment = self
            .store
            .find_payment(completion.payment_id)
            .await?
            .ok_or(PaymentError::PaymentNotFound)?;
        if !payment.status.can_transition_to(PaymentStatus::Completed) {
            return Err(PaymentError::InvalidTransition {
                from: payment.status,
                to: PaymentStatus::Completed,
            });
        }

        let now = Utc::now();
        let mut write = CompletedPaymentWrite {
            payment_id: payment.id,
            provider_transaction_id: completion.provider_transaction_id.clone(),
            paid_at: now,
            enrollment: None,
            subscription_activation: None,
            promo_usage: None,
            earning: None,
        };

        match (payment.course_id, payment.subscription_id) {
            (Some(course_id), None) => {
                write.enrollment = Some(Enrollment {
                    id: EnrollmentId::new(),
                    user_id: payment.user_id,
                    course_id,
                    progress: 0.0,
                    completed_lessons: 0,
                    enrolled_at: now,
                    completed_at: None,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                });
                write.earning = Some(self.course_sale_earning(&payment, course_id).await?);
            }
            (None, Some(subscription_id)) => {
                write.subscription_activation = Some(SubscriptionActivation {
                    subscription_id,
                    starts_at: now,
                    ends_at: now + Duration::days(SUBSCRIPTION_PERIOD_DAYS),
                });
            }
            _ => return Err(PaymentError::MissingTarget),
        }

        if let Some(promo_code_id) = payment.promo_code_id {
            write.promo_usage = Some(PromoCodeUsage {
                id: PromoUsageId::new(),
                promo_code_id,
                user_id: payment.user_id,
                payment_id: payment.id,
                discount_amount: payment.discount_amount,
                created_at: now,
            });
        }

        let outcome = self.store.apply_payment_completion(write).await?;

        self.store
            .record_audit(
                NewAuditEntry::new(actions::PAYMENT_COMPLETED, "payment")
                    .actor(payment.user_id)
                    .entity(payment.id.0)
                    .detail(format!("amount={} {}", payment.amount, payment.currency)),
            )
            .await?;
        if let Some(promo_code_id) = payment.promo_code_id {
            self.store
                .record_audit(
                    NewAuditEntry::new(actions::PROMO_REDEEMED, "promo_code")
                        .actor(payment.user_id)
                        .entity(promo_code_id.0)
                        .detail(format!("discount={}", payment.discount_amount)),
                )
                .await?;
        }
        info!(payment_id = %payment.id, amount = payment.amount, "payment completed");
        Ok(outcome)
    }

    /// Reconstructs the outcome of an already-completed payment.
    async fn outcome_of(&self, payment: &Payment) -> Result<PaymentOutcome, PaymentError> {
        match (payment.course_id, payment.subscription_id) {
            (Some(course_id), None) => {
                let enrollment = self
                    .store
                    .find_enrollment(payment.user_id, course_id)
                    .await?
                    .ok_or_else(|| {
                        PaymentError::Storage(AppError::internal_error(
                            "Completed course payment without an enrollment",
                        ))
                    })?;
                Ok(PaymentOutcome::Enrolled(enrollment))
            }
            (None, Some(subscription_id)) => {
                let subscription = self
                    .store
                    .find_subscription(subscription_id)
                    .await?
                    .ok_or_else(|| {
                        PaymentError::Storage(AppError::internal_error(
                            "Completed payment references a missing subscription",
                        ))
                    })?;
                Ok(PaymentOutcome::SubscriptionActivated(subscription))
            }
            _ => Err(PaymentError::MissingTarget),
        }
    }

    async fn course_sale_earning(
        &self,
        payment: &Payment,
        course_id: CourseId,
    ) -> Result<TeacherEarning, PaymentError> {
        let course = self
            .store
            .find_course(course_id)
            .await?
            .ok_or_else(|| {
                PaymentError::Storage(AppError::internal_error(
                    "Paid course no longer exists",
                ))
            })?;
        let gross = payment.amount;
        let commission = (gross as f64 * self.config.commission_rate).round() as i64;
        let now = Utc::now();
        Ok(TeacherEarning {
            id: EarningId::new(),
            teacher_id: course.teacher_id,
            kind: EarningKind::CourseSale,
            course_id: Some(course_id),
            period: None,
            payment_id: Some(payment.id),
            gross_amount: gross,
            net_amount: gross - commission,
            status: EarningStatus::Pending,
            payout_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Refunds up to the amount paid on a completed payment.
    #[instrument(skip(self))]
    pub async fn refund_payment(
        &self,
        payment_id: PaymentId,
        refund_amount: i64,
    ) -> Result<Payment, PaymentError> {
        let payment = self
            .store
            .find_payment(payment_id)
            .await?
            .ok_or(PaymentError::PaymentNotFound)?;
        if !payment.status.can_transition_to(PaymentStatus::Refunded) {
            return Err(PaymentError::InvalidTransition {
                from: payment.status,
                to: PaymentStatus::Refunded,
            });
        }
        if refund_amount <= 0 || refund_amount > payment.amount {
            return Err(PaymentError::RefundExceedsAmount);
        }

        let payment = self
            .store
            .apply_refund(payment_id, refund_amount, Utc::now())
            .await?;
        self.store
            .record_audit(
                NewAuditEntry::new(actions::PAYMENT_REFUNDED, "payment")
                    .actor(payment.user_id)
                    .entity(payment.id.0)
                    .detail(format!("refund={}", refund_amount)),
            )
            .await?;
        info!(payment_id = %payment.id, refund = refund_amount, "payment refunded");
        Ok(payment)
    }

    pub async fn list_payments(
        &self,
        user_id: UserId,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Payment>, i64), AppError> {
        self.store.list_payments_for_user(user_id, pagination).await
    }
}
