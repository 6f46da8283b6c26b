use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::{AppError, PaginationParams};
use edulife_models::courses::Course;
use edulife_models::ids::{CourseId, ReviewId};
use edulife_models::reviews::{Review, ReviewError};

use super::{is_unique_violation, storage_error, PostgresStore};
use crate::store::ports::ReviewStore;

fn review_storage(e: sqlx::Error) -> ReviewError {
    ReviewError::Storage(storage_error(e))
}

async fn recompute_aggregates(
    tx: &mut sqlx::PgConnection,
    course_id: CourseId,
    now: DateTime<Utc>,
) -> Result<Course, ReviewError> {
    sqlx::query_as::<_, Course>(
        r#"
        UPDATE courses c
        SET ratings_count = agg.count,
            rating_avg = ROUND(agg.avg::numeric, 2)::float8,
            updated_at = $2
        FROM (
            SELECT COUNT(*)::int AS count, COALESCE(AVG(rating), 0) AS avg
            FROM reviews
            WHERE course_id = $1 AND deleted_at IS NULL
        ) agg
        WHERE c.id = $1
        RETURNING c.*
        "#,
    )
    .bind(course_id)
    .bind(now)
    .fetch_optional(&mut *tx)
    .await
    .map_err(review_storage)?
    .ok_or_else(|| ReviewError::Storage(AppError::not_found("Course not found")))
}

#[async_trait]
impl ReviewStore for PostgresStore {
    async fn insert_review(&self, review: Review) -> Result<Course, ReviewError> {
        let mut tx = self.pool().begin().await.map_err(review_storage)?;

        sqlx::query(
            r#"
            INSERT INTO reviews (id, user_id, course_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(review.id)
        .bind(review.user_id)
        .bind(review.course_id)
        .bind(review.rating)
        .bind(review.comment)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ReviewError::AlreadyReviewed
            } else {
                review_storage(e)
            }
        })?;

        let course = recompute_aggregates(&mut tx, review.course_id, review.created_at).await?;
        tx.commit().await.map_err(review_storage)?;
        Ok(course)
    }

    async fn delete_review(&self, id: ReviewId, now: DateTime<Utc>) -> Result<Course, ReviewError> {
        let mut tx = self.pool().begin().await.map_err(review_storage)?;

        let review = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews SET deleted_at = $2, updated_at = $2
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(review_storage)?
        .ok_or(ReviewError::ReviewNotFound)?;

        let course = recompute_aggregates(&mut tx, review.course_id, now).await?;
        tx.commit().await.map_err(review_storage)?;
        Ok(course)
    }

    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>, AppError> {
        sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn list_reviews_for_course(
        &self,
        course_id: CourseId,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Review>, i64), AppError> {
        let reviews = sqlx::query_as::<_, Review>(
            r#"
            SELECT * FROM reviews
            WHERE course_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(course_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.pool())
        .await
        .map_err(storage_error)?;

        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM reviews WHERE course_id = $1 AND deleted_at IS NULL",
        )
        .bind(course_id)
        .fetch_one(self.pool())
        .await
        .map_err(storage_error)?;

        Ok((reviews, total))
    }
}
