use async_trait::async_trait;

use edulife_core::{round2, AppError, PaginationParams};
use edulife_models::enrollments::{Enrollment, EnrollmentError, LessonProgress};
use edulife_models::ids::{CourseId, LessonId, UserId};

use super::{is_unique_violation, storage_error, PostgresStore};
use crate::store::ports::ProgressStore;

fn progress_storage(e: sqlx::Error) -> EnrollmentError {
    EnrollmentError::Storage(storage_error(e))
}

#[async_trait]
impl ProgressStore for PostgresStore {
    async fn create_enrollment(
        &self,
        enrollment: Enrollment,
    ) -> Result<Enrollment, EnrollmentError> {
        let mut tx = self.pool().begin().await.map_err(progress_storage)?;

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
                EnrollmentError::AlreadyEnrolled
            } else {
                progress_storage(e)
            }
        })?;

        sqlx::query(
            r#"
            UPDATE courses SET students_count = students_count + 1, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(inserted.course_id)
        .execute(&mut *tx)
        .await
        .map_err(progress_storage)?;

        tx.commit().await.map_err(progress_storage)?;
        Ok(inserted)
    }

    async fn find_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, AppError> {
        sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT * FROM enrollments
            WHERE user_id = $1 AND course_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn list_enrollments_for_user(
        &self,
        user_id: UserId,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Enrollment>, i64), AppError> {
        let enrollments = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT * FROM enrollments
            WHERE user_id = $1 AND deleted_at IS NULL
            ORDER BY enrolled_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.pool())
        .await
        .map_err(storage_error)?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM enrollments WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(storage_error)?;

        Ok((enrollments, total))
    }

    async fn find_lesson_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, AppError> {
        sqlx::query_as::<_, LessonProgress>(
            "SELECT * FROM lesson_progress WHERE user_id = $1 AND lesson_id = $2",
        )
        .bind(user_id)
        .bind(lesson_id)
        .fetch_optional(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn watch_seconds_by_teacher(&self) -> Result<Vec<(UserId, i64)>, AppError> {
        let rows: Vec<(UserId, i64)> = sqlx::query_as(
            r#"
            SELECT c.teacher_id, COALESCE(SUM(lp.video_watched_seconds), 0)::bigint
            FROM lesson_progress lp
            JOIN courses c ON c.id = lp.course_id
            GROUP BY c.teacher_id
            ORDER BY c.teacher_id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(storage_error)?;
        Ok(rows)
    }

    async fn upsert_lesson_progress(
        &self,
        progress: LessonProgress,
    ) -> Result<Enrollment, EnrollmentError> {
        let mut tx = self.pool().begin().await.map_err(progress_storage)?;

        sqlx::query(
            r#"
            INSERT INTO lesson_progress
                (id, user_id, lesson_id, course_id, video_watched_seconds,
                 video_last_position, video_completed, is_completed, completed_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (user_id, lesson_id) DO UPDATE SET
                video_watched_seconds = EXCLUDED.video_watched_seconds,
                video_last_position = EXCLUDED.video_last_position,
                video_completed = EXCLUDED.video_completed,
                is_completed = EXCLUDED.is_completed,
                completed_at = EXCLUDED.completed_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(progress.id)
        .bind(progress.user_id)
        .bind(progress.lesson_id)
        .bind(progress.course_id)
        .bind(progress.video_watched_seconds)
        .bind(progress.video_last_position)
        .bind(progress.video_completed)
        .bind(progress.is_completed)
        .bind(progress.completed_at)
        .bind(progress.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(progress_storage)?;

        let (total_lessons,): (i32,) =
            sqlx::query_as("SELECT lessons_count FROM courses WHERE id = $1")
                .bind(progress.course_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(progress_storage)?
                .ok_or(EnrollmentError::CourseNotFound)?;

        let (completed,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM lesson_progress
            WHERE user_id = $1 AND course_id = $2 AND is_completed
            "#,
        )
        .bind(progress.user_id)
        .bind(progress.course_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(progress_storage)?;
        let completed = completed as i32;

        let percent = if total_lessons > 0 {
            round2(completed as f64 / total_lessons as f64 * 100.0)
        } else {
            0.0
        };
        let course_done = total_lessons > 0 && completed >= total_lessons;

        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            UPDATE enrollments
            SET completed_lessons = $3,
                progress = $4,
                completed_at = CASE WHEN $5 THEN COALESCE(completed_at, $6) ELSE completed_at END,
                updated_at = $6
            WHERE user_id = $1 AND course_id = $2 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(progress.user_id)
        .bind(progress.course_id)
        .bind(completed)
        .bind(percent)
        .bind(course_done)
        .bind(progress.updated_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(progress_storage)?
        .ok_or(EnrollmentError::NotEnrolled)?;

        tx.commit().await.map_err(progress_storage)?;
        Ok(enrollment)
    }
}
