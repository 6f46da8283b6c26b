use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::AppError;
use edulife_models::ids::VideoJobId;
use edulife_models::media::{MediaError, VideoJobStatus, VideoProcessingJob};

use super::{storage_error, PostgresStore};
use crate::store::ports::MediaStore;

fn media_storage(e: sqlx::Error) -> MediaError {
    MediaError::Storage(storage_error(e))
}

#[async_trait]
impl MediaStore for PostgresStore {
    async fn insert_video_job(
        &self,
        job: VideoProcessingJob,
    ) -> Result<VideoProcessingJob, AppError> {
        sqlx::query_as::<_, VideoProcessingJob>(
            r#"
            INSERT INTO video_processing_jobs (id, lesson_id, source_url, status, max_attempts)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(job.id)
        .bind(job.lesson_id)
        .bind(job.source_url)
        .bind(job.status)
        .bind(job.max_attempts)
        .fetch_one(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn find_video_job(
        &self,
        id: VideoJobId,
    ) -> Result<Option<VideoProcessingJob>, AppError> {
        sqlx::query_as::<_, VideoProcessingJob>(
            "SELECT * FROM video_processing_jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn claim_next_video_job(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<VideoProcessingJob>, AppError> {
        // SKIP LOCKED keeps concurrent workers off the same row.
        sqlx::query_as::<_, VideoProcessingJob>(
            r#"
            UPDATE video_processing_jobs
            SET status = 'downloading', attempts = attempts + 1, claimed_at = $1, updated_at = $1
            WHERE id = (
                SELECT id FROM video_processing_jobs
                WHERE status = 'pending'
                ORDER BY created_at
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING *
            "#,
        )
        .bind(now)
        .fetch_optional(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn advance_video_job(
        &self,
        id: VideoJobId,
        next: VideoJobStatus,
        output_url: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<VideoProcessingJob, MediaError> {
        let mut tx = self.pool().begin().await.map_err(media_storage)?;

        let job = sqlx::query_as::<_, VideoProcessingJob>(
            "SELECT * FROM video_processing_jobs WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(media_storage)?
        .ok_or(MediaError::JobNotFound)?;
        if !job.status.can_transition_to(next) {
            return Err(MediaError::InvalidTransition {
                from: job.status,
                to: next,
            });
        }

        let updated = sqlx::query_as::<_, VideoProcessingJob>(
            r#"
            UPDATE video_processing_jobs
            SET status = $2,
                output_url = COALESCE($3, output_url),
                completed_at = CASE WHEN $2 = 'completed' THEN $4 ELSE completed_at END,
                updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(next)
        .bind(output_url)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(media_storage)?;

        tx.commit().await.map_err(media_storage)?;
        Ok(updated)
    }

    async fn fail_video_job(
        &self,
        id: VideoJobId,
        error: String,
        now: DateTime<Utc>,
    ) -> Result<VideoProcessingJob, MediaError> {
        let mut tx = self.pool().begin().await.map_err(media_storage)?;

        let job = sqlx::query_as::<_, VideoProcessingJob>(
            "SELECT * FROM video_processing_jobs WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(media_storage)?
        .ok_or(MediaError::JobNotFound)?;
        if !job.status.can_transition_to(VideoJobStatus::Failed) {
            return Err(MediaError::InvalidTransition {
                from: job.status,
                to: VideoJobStatus::Failed,
            });
        }

        let next = if job.can_retry() {
            VideoJobStatus::Pending
        } else {
            VideoJobStatus::Failed
        };
        let updated = sqlx::query_as::<_, VideoProcessingJob>(
            r#"
            UPDATE video_processing_jobs
            SET status = $2,
                last_error = $3,
                claimed_at = CASE WHEN $2 = 'pending' THEN NULL ELSE claimed_at END,
                updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(next)
        .bind(error)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(media_storage)?;

        tx.commit().await.map_err(media_storage)?;
        Ok(updated)
    }
}
