use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::{AppError, PaginationParams};
use edulife_models::enrollments::Enrollment;
use edulife_models::ids::{PaymentId, PromoCodeId, SubscriptionId, UserId};
use edulife_models::payments::{
    Payment, PaymentError, PaymentOutcome, PaymentStatus, Subscription, SubscriptionStatus,
};
use edulife_models::promos::{PromoCode, PromoCodeUsage};

use super::{is_unique_violation, storage_error, PostgresStore};
use crate::store::ports::{CommerceStore, CompletedPaymentWrite};

fn payment_storage(e: sqlx::Error) -> PaymentError {
    PaymentError::Storage(storage_error(e))
}

#[async_trait]
impl CommerceStore for PostgresStore {
    async fn find_promo_by_code(&self, code: &str) -> Result<Option<PromoCode>, AppError> {
        sqlx::query_as::<_, PromoCode>("SELECT * FROM promo_codes WHERE UPPER(code) = UPPER($1)")
            .bind(code)
            .fetch_optional(self.pool())
            .await
            .map_err(storage_error)
    }

    async fn insert_promo(&self, promo: PromoCode) -> Result<PromoCode, AppError> {
        sqlx::query_as::<_, PromoCode>(
            r#"
            INSERT INTO promo_codes
                (id, code, discount_type, discount_value, max_discount, min_purchase,
                 usage_limit, usage_per_user, valid_from, valid_until, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(promo.id)
        .bind(promo.code)
        .bind(promo.discount_type)
        .bind(promo.discount_value)
        .bind(promo.max_discount)
        .bind(promo.min_purchase)
        .bind(promo.usage_limit)
        .bind(promo.usage_per_user)
        .bind(promo.valid_from)
        .bind(promo.valid_until)
        .bind(promo.is_active)
        .fetch_one(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn promo_usage_count_for_user(
        &self,
        promo_code_id: PromoCodeId,
        user_id: UserId,
    ) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM promo_code_usages WHERE promo_code_id = $1 AND user_id = $2",
        )
        .bind(promo_code_id)
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(storage_error)?;
        Ok(count)
    }

    async fn insert_payment(&self, payment: Payment) -> Result<Payment, AppError> {
        sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments
                (id, user_id, course_id, subscription_id, amount, currency,
                 discount_amount, promo_code_id, provider, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(payment.id)
        .bind(payment.user_id)
        .bind(payment.course_id)
        .bind(payment.subscription_id)
        .bind(payment.amount)
        .bind(payment.currency)
        .bind(payment.discount_amount)
        .bind(payment.promo_code_id)
        .bind(payment.provider)
        .bind(payment.status)
        .fetch_one(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn find_payment(&self, id: PaymentId) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(storage_error)
    }

    async fn find_payment_by_provider_tx(
        &self,
        provider_transaction_id: &str,
    ) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE provider_transaction_id = $1",
        )
        .bind(provider_transaction_id)
        .fetch_optional(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn list_payments_for_user(
        &self,
        user_id: UserId,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Payment>, i64), AppError> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT * FROM payments
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.pool())
        .await
        .map_err(storage_error)?;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM payments WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(self.pool())
                .await
                .map_err(storage_error)?;

        Ok((payments, total))
    }

    async fn update_payment_status(
        &self,
        id: PaymentId,
        status: PaymentStatus,
        now: DateTime<Utc>,
    ) -> Result<Payment, PaymentError> {
        let mut tx = self.pool().begin().await.map_err(payment_storage)?;

        let payment = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(payment_storage)?
        .ok_or(PaymentError::PaymentNotFound)?;
        if !payment.status.can_transition_to(status) {
            return Err(PaymentError::InvalidTransition {
                from: payment.status,
                to: status,
            });
        }

        let updated = sqlx::query_as::<_, Payment>(
            "UPDATE payments SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(payment_storage)?;

        tx.commit().await.map_err(payment_storage)?;
        Ok(updated)
    }

    async fn apply_payment_completion(
        &self,
        write: CompletedPaymentWrite,
    ) -> Result<PaymentOutcome, PaymentError> {
        let mut tx = self.pool().begin().await.map_err(payment_storage)?;

        let payment = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE id = $1 FOR UPDATE",
        )
        .bind(write.payment_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(payment_storage)?
        .ok_or(PaymentError::PaymentNotFound)?;
        if !payment.status.can_transition_to(PaymentStatus::Completed) {
            return Err(PaymentError::InvalidTransition {
                from: payment.status,
                to: PaymentStatus::Completed,
            });
        }

        sqlx::query(
            r#"
            UPDATE payments
            SET status = 'completed', provider_transaction_id = $2, paid_at = $3, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(write.payment_id)
        .bind(&write.provider_transaction_id)
        .bind(write.paid_at)
        .execute(&mut *tx)
        .await
        .map_err(payment_storage)?;

        if let Some(usage) = &write.promo_usage {
            sqlx::query(
                r#"
                INSERT INTO promo_code_usages
                    (id, promo_code_id, user_id, payment_id, discount_amount)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(usage.id)
            .bind(usage.promo_code_id)
            .bind(usage.user_id)
            .bind(usage.payment_id)
            .bind(usage.discount_amount)
            .execute(&mut *tx)
            .await
            .map_err(payment_storage)?;

            sqlx::query(
                "UPDATE promo_codes SET used_count = used_count + 1, updated_at = $2 WHERE id = $1",
            )
            .bind(usage.promo_code_id)
            .bind(write.paid_at)
            .execute(&mut *tx)
            .await
            .map_err(payment_storage)?;
        }

        if let Some(earning) = &write.earning {
            sqlx::query(
                r#"
                INSERT INTO teacher_earnings
                    (id, teacher_id, kind, course_id, period, payment_id,
                     gross_amount, net_amount, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(earning.id)
            .bind(earning.teacher_id)
            .bind(earning.kind)
            .bind(earning.course_id)
            .bind(&earning.period)
            .bind(earning.payment_id)
            .bind(earning.gross_amount)
            .bind(earning.net_amount)
            .bind(earning.status)
            .execute(&mut *tx)
            .await
            .map_err(payment_storage)?;
        }

        let outcome = if let Some(enrollment) = write.enrollment {
            let inserted = sqlx::query_as::<_, Enrollment>(
                r#"
                INSERT INTO enrollments (id, user_id, course_id, enrolled_at)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(enrollment.id)
            .bind(enrollment.user_id)
            .bind(enrollment.course_id)
            .bind(enrollment.enrolled_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PaymentError::AlreadyEnrolled
                } else {
                    payment_storage(e)
                }
            })?;

            sqlx::query(
                r#"
                UPDATE courses SET students_count = students_count + 1, updated_at = $2
                WHERE id = $1
                "#,
            )
            .bind(inserted.course_id)
            .bind(write.paid_at)
            .execute(&mut *tx)
            .await
            .map_err(payment_storage)?;

            PaymentOutcome::Enrolled(inserted)
        } else if let Some(activation) = write.subscription_activation {
            let subscription = sqlx::query_as::<_, Subscription>(
                r#"
                UPDATE subscriptions
                SET status = $2, starts_at = $3, ends_at = $4, updated_at = $5
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(activation.subscription_id)
            .bind(SubscriptionStatus::Active)
            .bind(activation.starts_at)
            .bind(activation.ends_at)
            .bind(write.paid_at)
            .fetch_optional(&mut *tx)
            .await
            .map_err(payment_storage)?
            .ok_or(PaymentError::MissingTarget)?;

            PaymentOutcome::SubscriptionActivated(subscription)
        } else {
            return Err(PaymentError::MissingTarget);
        };

        tx.commit().await.map_err(payment_storage)?;
        Ok(outcome)
    }

    async fn apply_refund(
        &self,
        id: PaymentId,
        refund_amount: i64,
        now: DateTime<Utc>,
    ) -> Result<Payment, PaymentError> {
        let mut tx = self.pool().begin().await.map_err(payment_storage)?;

        let payment = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(payment_storage)?
        .ok_or(PaymentError::PaymentNotFound)?;
        if !payment.status.can_transition_to(PaymentStatus::Refunded) {
            return Err(PaymentError::InvalidTransition {
                from: payment.status,
                to: PaymentStatus::Refunded,
            });
        }

        let updated = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET status = 'refunded', refund_amount = $2, refunded_at = $3, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(refund_amount)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(payment_storage)?;

        tx.commit().await.map_err(payment_storage)?;
        Ok(updated)
    }

    async fn insert_subscription(
        &self,
        subscription: Subscription,
    ) -> Result<Subscription, AppError> {
        sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (id, user_id, plan_code, price, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(subscription.id)
        .bind(subscription.user_id)
        .bind(subscription.plan_code)
        .bind(subscription.price)
        .bind(subscription.status)
        .fetch_one(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn find_subscription(
        &self,
        id: SubscriptionId,
    ) -> Result<Option<Subscription>, AppError> {
        sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(storage_error)
    }

    async fn active_subscriptions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Subscription>, AppError> {
        sqlx::query_as::<_, Subscription>(
            r#"
            SELECT * FROM subscriptions
            WHERE status = 'active' AND (ends_at IS NULL OR ends_at > $1)
            "#,
        )
        .bind(now)
        .fetch_all(self.pool())
        .await
        .map_err(storage_error)
    }
}
