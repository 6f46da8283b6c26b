mod common;

use common::{memory_store, progress_service, register_user, seed_course};
use edulife::modules::catalog::CatalogService;
use edulife_core::PaginationParams;
use edulife_models::courses::CreateCourseDto;
use edulife_models::enrollments::{EnrollmentError, WatchUpdateDto};
use edulife_models::users::UserRole;

fn beacon(watched: i32, position: i32) -> WatchUpdateDto {
    WatchUpdateDto {
        watched_seconds: watched,
        last_position: position,
    }
}

#[tokio::test]
async fn enrolling_twice_is_rejected() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let (course, _, _) = seed_course(&store, teacher.id, 0, 1).await;
    let progress = progress_service(store.clone());

    progress.enroll(student.id, course.id).await.unwrap();
    let err = progress.enroll(student.id, course.id).await.unwrap_err();
    assert!(matches!(err, EnrollmentError::AlreadyEnrolled));

    let (list, total) = progress
        .list_enrollments(student.id, &PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(list[0].course_id, course.id);
}

#[tokio::test]
async fn draft_courses_cannot_be_enrolled() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let catalog = CatalogService::new(store.clone());
    let draft = catalog
        .create_course(
            teacher.id,
            CreateCourseDto { title: "Unpublished".into(), description: None, price: 0 },
        )
        .await
        .unwrap();

    let err = progress_service(store.clone())
        .enroll(student.id, draft.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EnrollmentError::CourseNotPublished));
}

#[tokio::test]
async fn watch_progress_only_grows() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let (course, _, lessons) = seed_course(&store, teacher.id, 0, 1).await;
    let progress = progress_service(store.clone());
    progress.enroll(student.id, course.id).await.unwrap();

    let (row, _) = progress
        .record_watch(student.id, lessons[0], beacon(50, 50))
        .await
        .unwrap();
    assert_eq!(row.video_watched_seconds, 50);
    assert!(!row.is_completed);

    // A rewind beacon keeps the stored maximum but follows the position.
    let (row, _) = progress
        .record_watch(student.id, lessons[0], beacon(30, 10))
        .await
        .unwrap();
    assert_eq!(row.video_watched_seconds, 50);
    assert_eq!(row.video_last_position, 10);
}

#[tokio::test]
async fn watch_clamps_to_video_duration() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let (course, _, lessons) = seed_course(&store, teacher.id, 0, 1).await;
    let progress = progress_service(store.clone());
    progress.enroll(student.id, course.id).await.unwrap();

    let (row, _) = progress
        .record_watch(student.id, lessons[0], beacon(10_000, 100))
        .await
        .unwrap();
    assert_eq!(row.video_watched_seconds, 100);
    assert!(row.is_completed);
}

#[tokio::test]
async fn completion_threshold_and_rollup() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let (course, _, lessons) = seed_course(&store, teacher.id, 0, 2).await;
    let progress = progress_service(store.clone());
    progress.enroll(student.id, course.id).await.unwrap();

    // 89 of 100 seconds is under the 0.9 threshold.
    let (row, enrollment) = progress
        .record_watch(student.id, lessons[0], beacon(89, 89))
        .await
        .unwrap();
    assert!(!row.is_completed);
    assert_eq!(enrollment.completed_lessons, 0);

    let (row, enrollment) = progress
        .record_watch(student.id, lessons[0], beacon(90, 90))
        .await
        .unwrap();
    assert!(row.is_completed);
    assert_eq!(enrollment.completed_lessons, 1);
    assert_eq!(enrollment.progress, 50.0);
    assert!(enrollment.completed_at.is_none());

    let (_, enrollment) = progress
        .record_watch(student.id, lessons[1], beacon(100, 100))
        .await
        .unwrap();
    assert_eq!(enrollment.completed_lessons, 2);
    assert_eq!(enrollment.progress, 100.0);
    assert!(enrollment.completed_at.is_some());
}

#[tokio::test]
async fn completed_rows_never_change() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let (course, _, lessons) = seed_course(&store, teacher.id, 0, 1).await;
    let progress = progress_service(store.clone());
    progress.enroll(student.id, course.id).await.unwrap();

    let (done, _) = progress
        .record_watch(student.id, lessons[0], beacon(100, 100))
        .await
        .unwrap();
    assert!(done.is_completed);

    let (after, _) = progress
        .record_watch(student.id, lessons[0], beacon(5, 5))
        .await
        .unwrap();
    assert_eq!(after.video_watched_seconds, done.video_watched_seconds);
    assert_eq!(after.completed_at, done.completed_at);
}

#[tokio::test]
async fn watching_requires_enrollment() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let outsider = register_user(&store, "outsider@example.com", UserRole::Student).await;
    let (_, _, lessons) = seed_course(&store, teacher.id, 0, 1).await;

    let err = progress_service(store.clone())
        .record_watch(outsider.id, lessons[0], beacon(10, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EnrollmentError::NotEnrolled));
}
