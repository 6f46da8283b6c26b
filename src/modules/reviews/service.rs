//! Course reviews.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use validator::Validate;

use edulife_core::{AppError, PaginationParams};
use edulife_models::audit::{actions, NewAuditEntry};
use edulife_models::courses::Course;
use edulife_models::ids::{CourseId, ReviewId, UserId};
use edulife_models::reviews::{CreateReviewDto, Review, ReviewError};

use crate::store::Store;

pub struct ReviewService {
    store: Arc<dyn Store>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a review; only enrolled students may review a course.
    /// Returns the course with its refreshed rating aggregates.
    #[instrument(skip(self, dto))]
    pub async fn create_review(
        &self,
        user_id: UserId,
        course_id: CourseId,
        dto: CreateReviewDto,
    ) -> Result<(Review, Course), ReviewError> {
        dto.validate().map_err(|_| ReviewError::RatingOutOfRange)?;
        self.store
            .find_enrollment(user_id, course_id)
            .await?
            .ok_or(ReviewError::NotEnrolled)?;

        let now = Utc::now();
        let review = Review {
            id: ReviewId::new(),
            user_id,
            course_id,
            rating: dto.rating,
            comment: dto.comment,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let course = self.store.insert_review(review.clone()).await?;

        self.store
            .record_audit(
                NewAuditEntry::new(actions::REVIEW_CREATED, "review")
                    .actor(user_id)
                    .entity(review.id.0)
                    .detail(format!("rating={}", review.rating)),
            )
            .await?;
        info!(course_id = %course_id, rating = review.rating, "review created");
        Ok((review, course))
    }

    /// Moderation removal. Returns the course with recomputed aggregates.
    #[instrument(skip(self))]
    pub async fn remove_review(&self, review_id: ReviewId) -> Result<Course, ReviewError> {
        self.store
            .find_review(review_id)
            .await?
            .filter(|r| r.deleted_at.is_none())
            .ok_or(ReviewError::ReviewNotFound)?;
        self.store.delete_review(review_id, Utc::now()).await
    }

    pub async fn list_reviews(
        &self,
        course_id: CourseId,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Review>, i64), AppError> {
        self.store.list_reviews_for_course(course_id, pagination).await
    }
}
