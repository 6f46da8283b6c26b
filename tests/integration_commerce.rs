mod common;

use common::{memory_store, progress_service, register_user, seed_course};
use edulife_core::PaginationParams;
use edulife::modules::commerce::CommerceService;
use edulife_config::CommerceConfig;
use edulife_models::payments::{PaymentCompletion, PaymentError, PaymentOutcome, PaymentStatus};
use edulife_models::promos::{CreatePromoDto, DiscountType};
use edulife_models::users::UserRole;

fn commerce(store: std::sync::Arc<dyn edulife::store::Store>) -> CommerceService {
    CommerceService::new(store, CommerceConfig::default())
}

fn half_off() -> CreatePromoDto {
    CreatePromoDto {
        code: "HALF".into(),
        discount_type: DiscountType::Percentage,
        discount_value: 50,
        max_discount: None,
        min_purchase: None,
        usage_limit: None,
        usage_per_user: None,
        valid_from: None,
        valid_until: None,
    }
}

#[tokio::test]
async fn course_purchase_enrolls_and_pays_the_teacher() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let (course, _, _) = seed_course(&store, teacher.id, 10_000, 1).await;
    let commerce = commerce(store.clone());

    let payment = commerce
        .create_course_payment(student.id, course.id, "stripe", None)
        .await
        .unwrap();
    assert_eq!(payment.amount, 10_000);
    assert_eq!(payment.status, PaymentStatus::Pending);

    let outcome = commerce
        .complete_payment(PaymentCompletion {
            payment_id: payment.id,
            provider_transaction_id: "tx_1".into(),
        })
        .await
        .unwrap();
    let PaymentOutcome::Enrolled(enrollment) = outcome else {
        panic!("expected an enrollment");
    };
    assert_eq!(enrollment.user_id, student.id);
    assert_eq!(enrollment.course_id, course.id);

    // 30% platform commission on the sale.
    let earnings = store.list_pending_earnings(teacher.id).await.unwrap();
    assert_eq!(earnings.len(), 1);
    assert_eq!(earnings[0].gross_amount, 10_000);
    assert_eq!(earnings[0].net_amount, 7_000);
}

#[tokio::test]
async fn replayed_confirmation_returns_the_original_outcome() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let (course, _, _) = seed_course(&store, teacher.id, 5_000, 1).await;
    let commerce = commerce(store.clone());

    let payment = commerce
        .create_course_payment(student.id, course.id, "stripe", None)
        .await
        .unwrap();
    let completion = PaymentCompletion {
        payment_id: payment.id,
        provider_transaction_id: "tx_replay".into(),
    };
    commerce.complete_payment(completion.clone()).await.unwrap();
    let replay = commerce.complete_payment(completion).await.unwrap();
    assert!(matches!(replay, PaymentOutcome::Enrolled(_)));

    // No double enrollment and no double earning.
    let tree_course = store.find_course(course.id).await.unwrap().unwrap();
    assert_eq!(tree_course.students_count, 1);
    assert_eq!(store.list_pending_earnings(teacher.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn completion_cannot_duplicate_an_enrollment() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let (course, _, _) = seed_course(&store, teacher.id, 5_000, 1).await;
    let commerce = commerce(store.clone());

    let payment = commerce
        .create_course_payment(student.id, course.id, "stripe", None)
        .await
        .unwrap();

    // The student enrolls through another path while the payment is open.
    progress_service(store.clone())
        .enroll(student.id, course.id)
        .await
        .unwrap();

    let err = commerce
        .complete_payment(PaymentCompletion {
            payment_id: payment.id,
            provider_transaction_id: "tx_dup".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::AlreadyEnrolled));

    // One live enrollment for the pair, and the rejected completion left
    // the payment untouched.
    let (_, total) = store
        .list_enrollments_for_user(student.id, &PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    let course_after = store.find_course(course.id).await.unwrap().unwrap();
    assert_eq!(course_after.students_count, 1);
    let payment = store.find_payment(payment.id).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);

    // Opening a new payment for an owned course is refused outright.
    let err = commerce
        .create_course_payment(student.id, course.id, "stripe", None)
        .await
        .unwrap_err();
    assert_eq!(err.status().as_u16(), 409);
}

#[tokio::test]
async fn promo_discounts_the_basket_and_counts_usage() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let (course, _, _) = seed_course(&store, teacher.id, 10_000, 1).await;
    let commerce = commerce(store.clone());
    commerce.create_promo(half_off()).await.unwrap();

    let payment = commerce
        .create_course_payment(student.id, course.id, "stripe", Some("half"))
        .await
        .unwrap();
    assert_eq!(payment.discount_amount, 5_000);
    assert_eq!(payment.amount, 5_000);

    commerce
        .complete_payment(PaymentCompletion {
            payment_id: payment.id,
            provider_transaction_id: "tx_promo".into(),
        })
        .await
        .unwrap();

    let promo = store.find_promo_by_code("HALF").await.unwrap().unwrap();
    assert_eq!(promo.used_count, 1);
    assert_eq!(
        store
            .promo_usage_count_for_user(promo.id, student.id)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn subscription_payment_activates_the_subscription() {
    let store = memory_store();
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let commerce = commerce(store.clone());

    let (subscription, payment) = commerce
        .create_subscription_payment(student.id, "monthly", 2_900, "stripe", None)
        .await
        .unwrap();
    let outcome = commerce
        .complete_payment(PaymentCompletion {
            payment_id: payment.id,
            provider_transaction_id: "tx_sub".into(),
        })
        .await
        .unwrap();

    let PaymentOutcome::SubscriptionActivated(active) = outcome else {
        panic!("expected an activated subscription");
    };
    assert_eq!(active.id, subscription.id);
    assert!(active.is_active(chrono::Utc::now()));
    let ends = active.ends_at.unwrap();
    let starts = active.starts_at.unwrap();
    assert_eq!((ends - starts).num_days(), 30);
}

#[tokio::test]
async fn refunds_only_follow_completion_and_respect_the_amount() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let (course, _, _) = seed_course(&store, teacher.id, 5_000, 1).await;
    let commerce = commerce(store.clone());

    let payment = commerce
        .create_course_payment(student.id, course.id, "stripe", None)
        .await
        .unwrap();

    // Pending payments cannot be refunded.
    let err = commerce.refund_payment(payment.id, 1_000).await.unwrap_err();
    assert!(matches!(err, PaymentError::InvalidTransition { .. }));

    commerce
        .complete_payment(PaymentCompletion {
            payment_id: payment.id,
            provider_transaction_id: "tx_refund".into(),
        })
        .await
        .unwrap();

    let err = commerce.refund_payment(payment.id, 6_000).await.unwrap_err();
    assert!(matches!(err, PaymentError::RefundExceedsAmount));

    let refunded = commerce.refund_payment(payment.id, 5_000).await.unwrap();
    assert_eq!(refunded.status, PaymentStatus::Refunded);
    assert_eq!(refunded.refund_amount, 5_000);
    assert!(refunded.refunded_at.is_some());
}
