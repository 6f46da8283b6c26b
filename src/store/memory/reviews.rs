use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::{round2, AppError, PaginationParams};
use edulife_models::courses::Course;
use edulife_models::ids::{CourseId, ReviewId};
use edulife_models::reviews::{Review, ReviewError};

use super::{Inner, MemoryStore};
use crate::store::ports::ReviewStore;

fn recompute_aggregates(inner: &mut Inner, course_id: CourseId, now: DateTime<Utc>) {
    let live: Vec<i32> = inner
        .reviews
        .values()
        .filter(|r| r.deleted_at.is_none() && r.course_id == course_id)
        .map(|r| r.rating)
        .collect();
    if let Some(course) = inner.courses.get_mut(&course_id) {
        course.ratings_count = live.len() as i32;
        course.rating_avg = if live.is_empty() {
            0.0
        } else {
            round2(live.iter().sum::<i32>() as f64 / live.len() as f64)
        };
        course.updated_at = now;
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn insert_review(&self, review: Review) -> Result<Course, ReviewError> {
        let mut inner = self.lock();
        if inner.reviews.values().any(|r| {
            r.deleted_at.is_none()
                && r.user_id == review.user_id
                && r.course_id == review.course_id
        }) {
            return Err(ReviewError::AlreadyReviewed);
        }
        let course_id = review.course_id;
        let now = review.created_at;
        inner.reviews.insert(review.id, review);
        recompute_aggregates(&mut inner, course_id, now);
        inner
            .courses
            .get(&course_id)
            .cloned()
            .ok_or_else(|| ReviewError::Storage(AppError::not_found("Course not found")))
    }

    async fn delete_review(&self, id: ReviewId, now: DateTime<Utc>) -> Result<Course, ReviewError> {
        let mut inner = self.lock();
        let review = inner
            .reviews
            .get_mut(&id)
            .filter(|r| r.deleted_at.is_none())
            .ok_or(ReviewError::ReviewNotFound)?;
        review.deleted_at = Some(now);
        let course_id = review.course_id;
        recompute_aggregates(&mut inner, course_id, now);
        inner
            .courses
            .get(&course_id)
            .cloned()
            .ok_or_else(|| ReviewError::Storage(AppError::not_found("Course not found")))
    }

    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>, AppError> {
        Ok(self
            .lock()
            .reviews
            .get(&id)
            .filter(|r| r.deleted_at.is_none())
            .cloned())
    }

    async fn list_reviews_for_course(
        &self,
        course_id: CourseId,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Review>, i64), AppError> {
        let inner = self.lock();
        let mut reviews: Vec<Review> = inner
            .reviews
            .values()
            .filter(|r| r.deleted_at.is_none() && r.course_id == course_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = reviews.len() as i64;
        let page: Vec<Review> = reviews
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect();
        Ok((page, total))
    }
}
