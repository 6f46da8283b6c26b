use async_trait::async_trait;

use edulife_core::{AppError, PaginationParams};
use edulife_models::enrollments::{Enrollment, EnrollmentError, LessonProgress};
use edulife_models::ids::{CourseId, LessonId, UserId};

/// Enrollments and per-lesson progress.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Fails with [`EnrollmentError::AlreadyEnrolled`] when a live row for
    /// the pair exists; bumps the course's `students_count` in the same
    /// write.
    async fn create_enrollment(&self, enrollment: Enrollment)
        -> Result<Enrollment, EnrollmentError>;

    async fn find_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, AppError>;

    async fn list_enrollments_for_user(
        &self,
        user_id: UserId,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Enrollment>, i64), AppError>;

    async fn find_lesson_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, AppError>;

    /// Total watched seconds across all students, grouped by the teacher
    /// owning the watched course. Feeds subscription pool distribution.
    async fn watch_seconds_by_teacher(&self) -> Result<Vec<(UserId, i64)>, AppError>;

    /// Upserts the merged progress row and recomputes the enrollment
    /// rollup (completed lessons, percentage, completion timestamp) from
    /// stored rows, atomically. Returns the updated enrollment.
    async fn upsert_lesson_progress(
        &self,
        progress: LessonProgress,
    ) -> Result<Enrollment, EnrollmentError>;
}
