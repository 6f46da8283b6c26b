//! Course review models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use edulife_core::AppError;

use crate::ids::{CourseId, ReviewId, UserId};

/// One user's rating of a course.
///
/// At most one live review per (user, course), enforced by a partial
/// unique index. The course's `rating_avg`/`ratings_count` are recomputed
/// in the same operation that writes the review.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub course_id: CourseId,
    /// 1 through 5, inclusive.
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReviewDto {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// Named error kinds for review operations.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("You have already reviewed this course")]
    AlreadyReviewed,
    #[error("Only enrolled students can review a course")]
    NotEnrolled,
    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange,
    #[error("Review not found")]
    ReviewNotFound,
    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::AlreadyReviewed => AppError::conflict(err.to_string()),
            ReviewError::NotEnrolled => AppError::forbidden(err.to_string()),
            ReviewError::RatingOutOfRange => AppError::validation(err.to_string()),
            ReviewError::ReviewNotFound => AppError::not_found(err.to_string()),
            ReviewError::Storage(inner) => inner,
        }
    }
}
