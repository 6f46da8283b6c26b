mod common;

use common::{memory_store, progress_service, register_user, seed_course};
use edulife::modules::commerce::CommerceService;
use edulife::modules::payouts::PayoutService;
use edulife_config::CommerceConfig;
use edulife_models::earnings::{EarningKind, EarningStatus, PayoutError, PayoutStatus};
use edulife_models::enrollments::WatchUpdateDto;
use edulife_models::ids::{LessonId, UserId};
use edulife_models::payments::PaymentCompletion;
use edulife_models::users::UserRole;

fn payouts(store: std::sync::Arc<dyn edulife::store::Store>) -> PayoutService {
    PayoutService::new(store, CommerceConfig::default())
}

async fn watch_all(
    store: &std::sync::Arc<dyn edulife::store::Store>,
    student: UserId,
    lessons: &[LessonId],
) {
    let progress = progress_service(store.clone());
    for lesson in lessons {
        progress
            .record_watch(
                student,
                *lesson,
                WatchUpdateDto { watched_seconds: 100, last_position: 100 },
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn pool_splits_by_watch_time() {
    let store = memory_store();
    let prolific = register_user(&store, "prolific@example.com", UserRole::Teacher).await;
    let casual = register_user(&store, "casual@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;

    let (course_a, _, lessons_a) = seed_course(&store, prolific.id, 0, 3).await;
    let (course_b, _, lessons_b) = seed_course(&store, casual.id, 0, 1).await;
    let progress = progress_service(store.clone());
    progress.enroll(student.id, course_a.id).await.unwrap();
    progress.enroll(student.id, course_b.id).await.unwrap();
    watch_all(&store, student.id, &lessons_a).await;
    watch_all(&store, student.id, &lessons_b).await;

    // One active subscription funds the pool.
    let commerce = CommerceService::new(store.clone(), CommerceConfig::default());
    let (_, payment) = commerce
        .create_subscription_payment(student.id, "monthly", 4_000, "stripe", None)
        .await
        .unwrap();
    commerce
        .complete_payment(PaymentCompletion {
            payment_id: payment.id,
            provider_transaction_id: "tx_pool".into(),
        })
        .await
        .unwrap();

    let earnings = payouts(store.clone())
        .distribute_subscription_pool("2026-08")
        .await
        .unwrap();
    assert_eq!(earnings.len(), 2);
    assert!(earnings
        .iter()
        .all(|e| e.kind == EarningKind::SubscriptionPool
            && e.period.as_deref() == Some("2026-08")));

    // 300 vs 100 watched seconds: 3/4 and 1/4 of the 4000 pool.
    let by_teacher = |id| earnings.iter().find(|e| e.teacher_id == id).unwrap();
    assert_eq!(by_teacher(prolific.id).gross_amount, 3_000);
    assert_eq!(by_teacher(casual.id).gross_amount, 1_000);
    assert_eq!(by_teacher(prolific.id).net_amount, 2_100);
    assert_eq!(by_teacher(casual.id).net_amount, 700);
}

#[tokio::test]
async fn payout_batches_pending_earnings() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let (course, _, _) = seed_course(&store, teacher.id, 10_000, 1).await;

    let commerce = CommerceService::new(store.clone(), CommerceConfig::default());
    let payment = commerce
        .create_course_payment(student.id, course.id, "stripe", None)
        .await
        .unwrap();
    commerce
        .complete_payment(PaymentCompletion {
            payment_id: payment.id,
            provider_transaction_id: "tx_sale".into(),
        })
        .await
        .unwrap();

    let payouts = payouts(store.clone());
    let pending = payouts.list_pending_earnings(teacher.id).await.unwrap();
    let ids: Vec<_> = pending.iter().map(|e| e.id).collect();

    let payout = payouts.create_payout(teacher.id, &ids).await.unwrap();
    assert_eq!(payout.net_amount, 7_000);
    assert_eq!(payout.status, PayoutStatus::Pending);

    // The earning is reserved: it carries the payout id and leaves the
    // pending list, but stays pending until the transfer completes.
    assert!(payouts.list_pending_earnings(teacher.id).await.unwrap().is_empty());
    let earning = &store.find_earnings(&ids).await.unwrap()[0];
    assert_eq!(earning.status, EarningStatus::Pending);
    assert_eq!(earning.payout_id, Some(payout.id));

    // The same earnings cannot be claimed twice.
    let err = payouts.create_payout(teacher.id, &ids).await.unwrap_err();
    assert!(matches!(err, PayoutError::EarningAlreadyPaid));

    let done = payouts
        .complete_payout(payout.id, Some("BANK-REF-42".into()))
        .await
        .unwrap();
    assert_eq!(done.status, PayoutStatus::Completed);
    assert_eq!(done.bank_reference.as_deref(), Some("BANK-REF-42"));
    assert!(done.completed_at.is_some());

    // Completion is what marks the earnings paid.
    let earning = &store.find_earnings(&ids).await.unwrap()[0];
    assert_eq!(earning.status, EarningStatus::Paid);
}

#[tokio::test]
async fn payout_validation() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let other = register_user(&store, "other@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let (course, _, _) = seed_course(&store, other.id, 4_000, 1).await;

    let commerce = CommerceService::new(store.clone(), CommerceConfig::default());
    let payment = commerce
        .create_course_payment(student.id, course.id, "stripe", None)
        .await
        .unwrap();
    commerce
        .complete_payment(PaymentCompletion {
            payment_id: payment.id,
            provider_transaction_id: "tx_other".into(),
        })
        .await
        .unwrap();
    let other_ids: Vec<_> = store
        .list_pending_earnings(other.id)
        .await
        .unwrap()
        .iter()
        .map(|e| e.id)
        .collect();

    let payouts = payouts(store.clone());
    let err = payouts.create_payout(teacher.id, &[]).await.unwrap_err();
    assert!(matches!(err, PayoutError::EmptyPayout));

    // Another teacher's earnings cannot be claimed.
    let err = payouts
        .create_payout(teacher.id, &other_ids)
        .await
        .unwrap_err();
    assert!(matches!(err, PayoutError::MixedTeachers));
}
