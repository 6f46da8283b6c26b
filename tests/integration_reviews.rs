mod common;

use common::{memory_store, progress_service, register_user, seed_course};
use edulife::modules::reviews::ReviewService;
use edulife_core::PaginationParams;
use edulife_models::reviews::{CreateReviewDto, ReviewError};
use edulife_models::users::UserRole;

fn review(rating: i32) -> CreateReviewDto {
    CreateReviewDto {
        rating,
        comment: Some("Solid material".into()),
    }
}

#[tokio::test]
async fn only_enrolled_students_can_review() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let outsider = register_user(&store, "outsider@example.com", UserRole::Student).await;
    let (course, _, _) = seed_course(&store, teacher.id, 0, 1).await;

    let err = ReviewService::new(store.clone())
        .create_review(outsider.id, course.id, review(5))
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::NotEnrolled));
}

#[tokio::test]
async fn ratings_roll_up_into_the_course() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let alice = register_user(&store, "alice@example.com", UserRole::Student).await;
    let bob = register_user(&store, "bob@example.com", UserRole::Student).await;
    let (course, _, _) = seed_course(&store, teacher.id, 0, 1).await;
    let progress = progress_service(store.clone());
    progress.enroll(alice.id, course.id).await.unwrap();
    progress.enroll(bob.id, course.id).await.unwrap();
    let reviews = ReviewService::new(store.clone());

    let (_, course_after) = reviews
        .create_review(alice.id, course.id, review(5))
        .await
        .unwrap();
    assert_eq!(course_after.ratings_count, 1);
    assert_eq!(course_after.rating_avg, 5.0);

    let (_, course_after) = reviews
        .create_review(bob.id, course.id, review(4))
        .await
        .unwrap();
    assert_eq!(course_after.ratings_count, 2);
    assert_eq!(course_after.rating_avg, 4.5);

    let (list, total) = reviews
        .list_reviews(course.id, &PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(list.len(), 2);
}

#[tokio::test]
async fn one_review_per_student() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let (course, _, _) = seed_course(&store, teacher.id, 0, 1).await;
    progress_service(store.clone())
        .enroll(student.id, course.id)
        .await
        .unwrap();
    let reviews = ReviewService::new(store.clone());

    reviews
        .create_review(student.id, course.id, review(3))
        .await
        .unwrap();
    let err = reviews
        .create_review(student.id, course.id, review(5))
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::AlreadyReviewed));
}

#[tokio::test]
async fn out_of_range_ratings_are_rejected() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let (course, _, _) = seed_course(&store, teacher.id, 0, 1).await;
    progress_service(store.clone())
        .enroll(student.id, course.id)
        .await
        .unwrap();

    let err = ReviewService::new(store.clone())
        .create_review(student.id, course.id, review(6))
        .await
        .unwrap_err();
    assert!(matches!(err, ReviewError::RatingOutOfRange));
}

#[tokio::test]
async fn moderation_removal_recomputes_aggregates() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let alice = register_user(&store, "alice@example.com", UserRole::Student).await;
    let bob = register_user(&store, "bob@example.com", UserRole::Student).await;
    let (course, _, _) = seed_course(&store, teacher.id, 0, 1).await;
    let progress = progress_service(store.clone());
    progress.enroll(alice.id, course.id).await.unwrap();
    progress.enroll(bob.id, course.id).await.unwrap();
    let reviews = ReviewService::new(store.clone());

    let (low, _) = reviews
        .create_review(alice.id, course.id, review(1))
        .await
        .unwrap();
    reviews
        .create_review(bob.id, course.id, review(5))
        .await
        .unwrap();

    let course_after = reviews.remove_review(low.id).await.unwrap();
    assert_eq!(course_after.ratings_count, 1);
    assert_eq!(course_after.rating_avg, 5.0);

    let err = reviews.remove_review(low.id).await.unwrap_err();
    assert!(matches!(err, ReviewError::ReviewNotFound));
}
