//! Pure promo code evaluation.

use chrono::{DateTime, Utc};

use edulife_models::promos::{Discount, DiscountType, PromoCode, PromoError};

/// Evaluates a promo code against a basket amount.
///
/// Checks run in a fixed order so the caller always gets the most
/// fundamental failure: inactive, then time window, then global
/// exhaustion, then the per-user limit, then the minimum purchase.
/// `user_usage_count` is how many times this user has already redeemed
/// the code.
pub fn evaluate_promo(
    promo: &PromoCode,
    user_usage_count: i64,
    basket_amount: i64,
    now: DateTime<Utc>,
) -> Result<Discount, PromoError> {
    if !promo.is_active {
        return Err(PromoError::PromoInactive);
    }
    if !promo.is_within_window(now) {
        return Err(PromoError::PromoExpired);
    }
    if promo.is_exhausted() {
        return Err(PromoError::PromoExhausted);
    }
    if promo
        .usage_per_user
        .is_some_and(|limit| user_usage_count >= limit as i64)
    {
        return Err(PromoError::PromoUserLimitReached);
    }
    if let Some(minimum) = promo.min_purchase {
        if basket_amount < minimum {
            return Err(PromoError::PromoMinimumNotMet { minimum });
        }
    }

    let raw = match promo.discount_type {
        DiscountType::Percentage => basket_amount * promo.discount_value / 100,
        DiscountType::Fixed => promo.discount_value,
    };
    let capped = match promo.max_discount {
        Some(cap) => raw.min(cap),
        None => raw,
    };
    // A discount never exceeds the basket.
    let amount = capped.clamp(0, basket_amount);

    Ok(Discount {
        amount,
        promo_code_id: promo.id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use edulife_models::ids::PromoCodeId;

    fn promo(discount_type: DiscountType, value: i64) -> PromoCode {
        let now = Utc::now();
        PromoCode {
            id: PromoCodeId::new(),
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
    fn percentage_discount() {
        let p = promo(DiscountType::Percentage, 25);
        let d = evaluate_promo(&p, 0, 10_000, Utc::now()).unwrap();
        assert_eq!(d.amount, 2_500);
    }

    #[test]
    fn fixed_discount_capped_by_basket() {
        let p = promo(DiscountType::Fixed, 5_000);
        let d = evaluate_promo(&p, 0, 3_000, Utc::now()).unwrap();
        assert_eq!(d.amount, 3_000);
    }

    #[test]
    fn max_discount_caps_percentage() {
        let mut p = promo(DiscountType::Percentage, 50);
        p.max_discount = Some(1_000);
        let d = evaluate_promo(&p, 0, 10_000, Utc::now()).unwrap();
        assert_eq!(d.amount, 1_000);
    }

    #[test]
    fn inactive_reported_before_window() {
        let mut p = promo(DiscountType::Fixed, 500);
        p.is_active = false;
        p.valid_until = Some(Utc::now() - Duration::days(1));
        assert!(matches!(
            evaluate_promo(&p, 0, 10_000, Utc::now()),
            Err(PromoError::PromoInactive)
        ));
    }

    #[test]
    fn expired_window() {
        let mut p = promo(DiscountType::Fixed, 500);
        p.valid_until = Some(Utc::now() - Duration::days(1));
        assert!(matches!(
            evaluate_promo(&p, 0, 10_000, Utc::now()),
            Err(PromoError::PromoExpired)
        ));
    }

    #[test]
    fn per_user_limit() {
        let mut p = promo(DiscountType::Fixed, 500);
        p.usage_per_user = Some(2);
        assert!(evaluate_promo(&p, 1, 10_000, Utc::now()).is_ok());
        assert!(matches!(
            evaluate_promo(&p, 2, 10_000, Utc::now()),
            Err(PromoError::PromoUserLimitReached)
        ));
    }

    #[test]
    fn minimum_purchase() {
        let mut p = promo(DiscountType::Fixed, 500);
        p.min_purchase = Some(5_000);
        assert!(matches!(
            evaluate_promo(&p, 0, 4_999, Utc::now()),
            Err(PromoError::PromoMinimumNotMet { minimum: 5_000 })
        ));
        assert!(evaluate_promo(&p, 0, 5_000, Utc::now()).is_ok());
    }
}
