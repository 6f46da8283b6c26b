//! Enrollment and video progress tracking.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use edulife_config::ProgressConfig;
use edulife_core::{AppError, PaginationParams};
use edulife_models::audit::{actions, NewAuditEntry};
use edulife_models::courses::CourseStatus;
use edulife_models::enrollments::{Enrollment, EnrollmentError, LessonProgress, WatchUpdateDto};
use edulife_models::ids::{CourseId, LessonId, LessonProgressId, UserId};

use crate::store::Store;

pub struct ProgressService {
    store: Arc<dyn Store>,
    config: ProgressConfig,
}

impl ProgressService {
    pub fn new(store: Arc<dyn Store>, config: ProgressConfig) -> Self {
        Self { store, config }
    }

    /// Free enrollment into a published course. Paid enrollment goes
    /// through payment completion instead.
    #[instrument(skip(self))]
    pub async fn enroll(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Enrollment, EnrollmentError> {
        let course = self
            .store
            .find_course(course_id)
            .await?
            .ok_or(EnrollmentError::CourseNotFound)?;
        if course.status != CourseStatus::Published {
            return Err(EnrollmentError::CourseNotPublished);
        }

        let now = Utc::now();
        let enrollment = self
            .store
            .create_enrollment(Enrollment {
                id: edulife_models::ids::EnrollmentId::new(),
                user_id,
                course_id,
                progress: 0.0,
                completed_lessons: 0,
                enrolled_at: now,
                completed_at: None,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            })
            .await?;

        self.store
            .record_audit(
                NewAuditEntry::new(actions::ENROLLMENT_CREATED, "enrollment")
                    .actor(user_id)
                    .entity(enrollment.id.0),
            )
            .await?;
        info!(user_id = %user_id, course_id = %course_id, "enrolled");
        Ok(enrollment)
    }

    pub async fn list_enrollments(
        &self,
        user_id: UserId,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Enrollment>, i64), AppError> {
        self.store.list_enrollments_for_user(user_id, pagination).await
    }

    /// Records a video progress beacon.
    ///
    /// `video_watched_seconds` only ever grows: a beacon reporting less
    /// than the stored value (a rewind, an out-of-order delivery) keeps
    /// the stored maximum. `video_last_position` always follows the
    /// player. A completed lesson row never changes again.
    #[instrument(skip(self, dto))]
    pub async fn record_watch(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
        dto: WatchUpdateDto,
    ) -> Result<(LessonProgress, Enrollment), EnrollmentError> {
        dto.validate()
            .map_err(|e| EnrollmentError::Storage(AppError::validation(e.to_string())))?;
        let now = Utc::now();

        let lesson = self
            .store
            .find_lesson(lesson_id)
            .await?
            .ok_or(EnrollmentError::LessonNotFound)?;
        let enrollment = self
            .store
            .find_enrollment(user_id, lesson.course_id)
            .await?
            .ok_or(EnrollmentError::NotEnrolled)?;

        let existing = self.store.find_lesson_progress(user_id, lesson_id).await?;
        if let Some(row) = &existing {
            if row.is_completed {
                return Ok((row.clone(), enrollment));
            }
        }

        let watched = existing
            .as_ref()
            .map(|row| row.video_watched_seconds.max(dto.watched_seconds))
            .unwrap_or(dto.watched_seconds);
        // Clamp to the video length when it is known.
        let watched = match lesson.video_duration_seconds {
            Some(duration) => watched.min(duration),
            None => watched,
        };

        let video_completed = match lesson.video_duration_seconds {
            Some(duration) if duration > 0 => {
                watched as f64 / duration as f64 >= self.config.completion_threshold
            }
            _ => false,
        };
        let is_completed = video_completed;

        let progress = LessonProgress {
            id: existing
                .as_ref()
                .map(|row| row.id)
                .unwrap_or_else(LessonProgressId::new),
            user_id,
            lesson_id,
            course_id: lesson.course_id,
            video_watched_seconds: watched,
            video_last_position: dto.last_position,
            video_completed,
            is_completed,
            completed_at: if is_completed { Some(now) } else { None },
            created_at: existing.as_ref().map(|row| row.created_at).unwrap_or(now),
            updated_at: now,
        };

        let enrollment = self.store.upsert_lesson_progress(progress.clone()).await?;
        Ok((progress, enrollment))
    }
}
