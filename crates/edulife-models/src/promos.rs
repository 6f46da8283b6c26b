//! Promo code models and discount arithmetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use edulife_core::AppError;

use crate::ids::{PaymentId, PromoCodeId, PromoUsageId, UserId};

/// Discount kind, stored as the `discount_type` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "discount_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` is a percentage of the basket, 0..=100.
    Percentage,
    /// `discount_value` is a fixed amount in minor units.
    Fixed,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PromoCode {
    pub id: PromoCodeId,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    /// Cap on the computed discount, in minor units.
    pub max_discount: Option<i64>,
    /// Minimum basket amount required, in minor units.
    pub min_purchase: Option<i64>,
    /// Total redemptions allowed across all users; `None` is unlimited.
    pub usage_limit: Option<i32>,
    /// Redemptions allowed per user; `None` is unlimited.
    pub usage_per_user: Option<i32>,
    pub used_count: i32,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PromoCode {
    /// Time-window check. Missing bounds are unbounded; bounds are inclusive.
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        self.valid_from.is_none_or(|from| now >= from)
            && self.valid_until.is_none_or(|until| now <= until)
    }

    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .is_some_and(|limit| self.used_count >= limit)
    }
}

/// One redemption of a promo code.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PromoCodeUsage {
    pub id: PromoUsageId,
    pub promo_code_id: PromoCodeId,
    pub user_id: UserId,
    pub payment_id: PaymentId,
    pub discount_amount: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct CreatePromoDto {
    #[validate(length(min = 3, max = 64))]
    pub code: String,
    pub discount_type: DiscountType,
    #[validate(range(min = 1))]
    pub discount_value: i64,
    pub max_discount: Option<i64>,
    pub min_purchase: Option<i64>,
    pub usage_limit: Option<i32>,
    pub usage_per_user: Option<i32>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
}

/// An evaluated discount, ready to apply to a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Discount {
    pub amount: i64,
    pub promo_code_id: PromoCodeId,
}

/// Named error kinds for promo code evaluation.
#[derive(Debug, thiserror::Error)]
pub enum PromoError {
    #[error("Promo code not found")]
    PromoNotFound,
    #[error("Promo code is not currently valid")]
    PromoExpired,
    #[error("Promo code has reached its usage limit")]
    PromoExhausted,
    #[error("You have already used this promo code the maximum number of times")]
    PromoUserLimitReached,
    #[error("Order must be at least {minimum} to use this promo code")]
    PromoMinimumNotMet { minimum: i64 },
    #[error("Promo code is not active")]
    PromoInactive,
    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<PromoError> for AppError {
    fn from(err: PromoError) -> Self {
        match err {
            PromoError::PromoNotFound => AppError::not_found(err.to_string()),
            PromoError::PromoExpired
            | PromoError::PromoExhausted
            | PromoError::PromoUserLimitReached
            | PromoError::PromoInactive => AppError::conflict(err.to_string()),
            PromoError::PromoMinimumNotMet { .. } => AppError::validation(err.to_string()),
            PromoError::Storage(inner) => inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn code(discount_type: DiscountType, value: i64) -> PromoCode {
        let now = Utc::now();
        PromoCode {
            id: PromoCodeId::from_uuid(Uuid::nil()),
            code: "WELCOME".into(),
            discount_type,
            discount_value: value,
            max_discount: None,
            min_purchase: None,
            usage_limit: None,
            usage_per_user: None,
            used_count: 0,
            valid_from: None,
            valid_until: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = Utc::now();
        let mut promo = code(DiscountType::Fixed, 500);
        promo.valid_from = Some(now);
        promo.valid_until = Some(now);
        assert!(promo.is_within_window(now));
        assert!(!promo.is_within_window(now + Duration::seconds(1)));
        assert!(!promo.is_within_window(now - Duration::seconds(1)));
    }

    #[test]
    fn missing_bounds_are_unbounded() {
        let promo = code(DiscountType::Percentage, 10);
        assert!(promo.is_within_window(Utc::now() + Duration::days(10_000)));
    }

    #[test]
    fn exhaustion_requires_a_limit() {
        let mut promo = code(DiscountType::Fixed, 500);
        promo.used_count = 1_000;
        assert!(!promo.is_exhausted());
        promo.usage_limit = Some(1_000);
        assert!(promo.is_exhausted());
    }
}
