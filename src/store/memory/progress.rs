use async_trait::async_trait;

use edulife_core::{round2, AppError, PaginationParams};
use edulife_models::enrollments::{Enrollment, EnrollmentError, LessonProgress};
use edulife_models::ids::{CourseId, LessonId, UserId};

use super::MemoryStore;
use crate::store::ports::ProgressStore;

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn create_enrollment(
        &self,
        enrollment: Enrollment,
    ) -> Result<Enrollment, EnrollmentError> {
        let mut inner = self.lock();
        if inner.enrollments.values().any(|e| {
            e.deleted_at.is_none()
                && e.user_id == enrollment.user_id
                && e.course_id == enrollment.course_id
        }) {
            return Err(EnrollmentError::AlreadyEnrolled);
        }
        inner.enrollments.insert(enrollment.id, enrollment.clone());
        if let Some(course) = inner.courses.get_mut(&enrollment.course_id) {
            course.students_count += 1;
            course.updated_at = enrollment.created_at;
        }
        Ok(enrollment)
    }

    async fn find_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, AppError> {
        Ok(self
            .lock()
            .enrollments
            .values()
            .find(|e| {
                e.deleted_at.is_none() && e.user_id == user_id && e.course_id == course_id
            })
            .cloned())
    }

    async fn list_enrollments_for_user(
        &self,
        user_id: UserId,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Enrollment>, i64), AppError> {
        let inner = self.lock();
        let mut enrollments: Vec<Enrollment> = inner
            .enrollments
            .values()
            .filter(|e| e.deleted_at.is_none() && e.user_id == user_id)
            .cloned()
            .collect();
        enrollments.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));
        let total = enrollments.len() as i64;
        let page: Vec<Enrollment> = enrollments
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect();
        Ok((page, total))
    }

    async fn find_lesson_progress(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonProgress>, AppError> {
        Ok(self
            .lock()
            .lesson_progress
            .values()
            .find(|p| p.user_id == user_id && p.lesson_id == lesson_id)
            .cloned())
    }

    async fn watch_seconds_by_teacher(&self) -> Result<Vec<(UserId, i64)>, AppError> {
        let inner = self.lock();
        let mut totals: std::collections::HashMap<UserId, i64> = std::collections::HashMap::new();
        for progress in inner.lesson_progress.values() {
            if let Some(course) = inner.courses.get(&progress.course_id) {
                *totals.entry(course.teacher_id).or_insert(0) +=
                    progress.video_watched_seconds as i64;
            }
        }
        let mut rows: Vec<(UserId, i64)> = totals.into_iter().collect();
        rows.sort_by_key(|(teacher_id, _)| teacher_id.0);
        Ok(rows)
    }

    async fn upsert_lesson_progress(
        &self,
        progress: LessonProgress,
    ) -> Result<Enrollment, EnrollmentError> {
        let mut inner = self.lock();

        let existing_id = inner
            .lesson_progress
            .values()
            .find(|p| p.user_id == progress.user_id && p.lesson_id == progress.lesson_id)
            .map(|p| p.id);
        match existing_id {
            Some(id) => {
                let mut row = progress.clone();
                row.id = id;
                inner.lesson_progress.insert(id, row);
            }
            None => {
                inner.lesson_progress.insert(progress.id, progress.clone());
            }
        }

        // Rollup from stored rows, never from the caller's view.
        let total_lessons = inner
            .courses
            .get(&progress.course_id)
            .map(|c| c.lessons_count)
            .unwrap_or(0);
        let completed = inner
            .lesson_progress
            .values()
            .filter(|p| {
                p.user_id == progress.user_id
                    && p.course_id == progress.course_id
                    && p.is_completed
            })
            .count() as i32;

        let enrollment = inner
            .enrollments
            .values_mut()
            .find(|e| {
                e.deleted_at.is_none()
                    && e.user_id == progress.user_id
                    && e.course_id == progress.course_id
            })
            .ok_or(EnrollmentError::NotEnrolled)?;
        enrollment.completed_lessons = completed;
        enrollment.progress = if total_lessons > 0 {
            round2(completed as f64 / total_lessons as f64 * 100.0)
        } else {
            0.0
        };
        if total_lessons > 0 && completed >= total_lessons && enrollment.completed_at.is_none() {
            enrollment.completed_at = Some(progress.updated_at);
        }
        enrollment.updated_at = progress.updated_at;
        Ok(enrollment.clone())
    }
}
