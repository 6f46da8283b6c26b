use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::{AppError, PaginationParams};
use edulife_models::courses::Course;
use edulife_models::ids::{CourseId, ReviewId};
use edulife_models::reviews::{Review, ReviewError};

/// Course reviews and their aggregates.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Inserts the review and recomputes the course's `rating_avg` and
    /// `ratings_count` from live rows, atomically. Fails with
    /// [`ReviewError::AlreadyReviewed`] when the pair already has a live
    /// review. Returns the updated course.
    async fn insert_review(&self, review: Review) -> Result<Course, ReviewError>;

    /// Soft-deletes the review and recomputes the aggregates.
    async fn delete_review(&self, id: ReviewId, now: DateTime<Utc>) -> Result<Course, ReviewError>;

    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>, AppError>;

    async fn list_reviews_for_course(
        &self,
        course_id: CourseId,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Review>, i64), AppError>;
}
