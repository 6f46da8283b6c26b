//! Enrollment and lesson-progress models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use edulife_core::AppError;

use crate::ids::{CourseId, EnrollmentId, LessonId, LessonProgressId, UserId};

/// Links a user to a course.
///
/// Exactly one non-deleted row per (user, course) pair, enforced by a
/// partial unique index. `progress` is a percentage with two decimals;
/// `completed_lessons` never exceeds the course's live lesson count.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub progress: f64,
    pub completed_lessons: i32,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Per-(user, lesson) progress; rolls up into [`Enrollment::progress`].
///
/// `video_watched_seconds` is monotonically non-decreasing;
/// `video_last_position` may move either direction (seek/rewind). Once
/// `is_completed` the row is immutable.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LessonProgress {
    pub id: LessonProgressId,
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub course_id: CourseId,
    pub video_watched_seconds: i32,
    pub video_last_position: i32,
    pub video_completed: bool,
    pub is_completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Progress beacon from the video player.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct WatchUpdateDto {
    #[validate(range(min = 0))]
    pub watched_seconds: i32,
    #[validate(range(min = 0))]
    pub last_position: i32,
}

/// Named error kinds for enrollment and progress operations.
#[derive(Debug, thiserror::Error)]
pub enum EnrollmentError {
    #[error("Already enrolled in this course")]
    AlreadyEnrolled,
    #[error("Course is not published")]
    CourseNotPublished,
    #[error("Not enrolled in this course")]
    NotEnrolled,
    #[error("Course not found")]
    CourseNotFound,
    #[error("Lesson not found")]
    LessonNotFound,
    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<EnrollmentError> for AppError {
    fn from(err: EnrollmentError) -> Self {
        match err {
            EnrollmentError::AlreadyEnrolled => AppError::conflict(err.to_string()),
            EnrollmentError::CourseNotPublished => AppError::validation(err.to_string()),
            EnrollmentError::NotEnrolled => AppError::forbidden(err.to_string()),
            EnrollmentError::CourseNotFound | EnrollmentError::LessonNotFound => {
                AppError::not_found(err.to_string())
            }
            EnrollmentError::Storage(inner) => inner,
        }
    }
}
