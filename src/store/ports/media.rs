use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::AppError;
use edulife_models::ids::VideoJobId;
use edulife_models::media::{MediaError, VideoJobStatus, VideoProcessingJob};

/// The video processing job queue.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn insert_video_job(
        &self,
        job: VideoProcessingJob,
    ) -> Result<VideoProcessingJob, AppError>;

    async fn find_video_job(&self, id: VideoJobId) -> Result<Option<VideoProcessingJob>, AppError>;

    /// Claims the oldest pending job: moves it to `downloading`, bumps
    /// `attempts`, and stamps `claimed_at`, atomically with respect to
    /// other workers.
    async fn claim_next_video_job(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<VideoProcessingJob>, AppError>;

    /// Moves an in-flight job to the next pipeline stage. Fails with
    /// [`MediaError::InvalidTransition`] for anything the pipeline does
    /// not allow.
    async fn advance_video_job(
        &self,
        id: VideoJobId,
        next: VideoJobStatus,
        output_url: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<VideoProcessingJob, MediaError>;

    /// Records the failure; the job returns to `pending` when attempts
    /// remain, otherwise stays `failed`.
    async fn fail_video_job(
        &self,
        id: VideoJobId,
        error: String,
        now: DateTime<Utc>,
    ) -> Result<VideoProcessingJob, MediaError>;
}
