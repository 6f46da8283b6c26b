use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::AppError;
use edulife_models::ids::VideoJobId;
use edulife_models::media::{MediaError, VideoJobStatus, VideoProcessingJob};

use super::MemoryStore;
use crate::store::ports::MediaStore;

#[async_trait]
impl MediaStore for MemoryStore {
    async fn insert_video_job(
        &self,
        job: VideoProcessingJob,
    ) -> Result<VideoProcessingJob, AppError> {
        self.lock().video_jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn find_video_job(
        &self,
        id: VideoJobId,
    ) -> Result<Option<VideoProcessingJob>, AppError> {
        Ok(self.lock().video_jobs.get(&id).cloned())
    }

    async fn claim_next_video_job(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<VideoProcessingJob>, AppError> {
        let mut inner = self.lock();
        let next_id = inner
            .video_jobs
            .values()
            .filter(|j| j.status == VideoJobStatus::Pending)
            .min_by_key(|j| j.created_at)
            .map(|j| j.id);
        let Some(id) = next_id else {
            return Ok(None);
        };
        let job = inner
            .video_jobs
            .get_mut(&id)
            .ok_or_else(|| AppError::internal_error("Claimed job vanished"))?;
        job.status = VideoJobStatus::Downloading;
        job.attempts += 1;
        job.claimed_at = Some(now);
        job.updated_at = now;
        Ok(Some(job.clone()))
    }

    async fn advance_video_job(
        &self,
        id: VideoJobId,
        next: VideoJobStatus,
        output_url: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<VideoProcessingJob, MediaError> {
        let mut inner = self.lock();
        let job = inner.video_jobs.get_mut(&id).ok_or(MediaError::JobNotFound)?;
        if !job.status.can_transition_to(next) {
            return Err(MediaError::InvalidTransition {
                from: job.status,
                to: next,
            });
        }
        job.status = next;
        if let Some(url) = output_url {
            job.output_url = Some(url);
        }
        if next == VideoJobStatus::Completed {
            job.completed_at = Some(now);
        }
        job.updated_at = now;
        Ok(job.clone())
    }

    async fn fail_video_job(
        &self,
        id: VideoJobId,
        error: String,
        now: DateTime<Utc>,
    ) -> Result<VideoProcessingJob, MediaError> {
        let mut inner = self.lock();
        let job = inner.video_jobs.get_mut(&id).ok_or(MediaError::JobNotFound)?;
        if !job.status.can_transition_to(VideoJobStatus::Failed) {
            return Err(MediaError::InvalidTransition {
                from: job.status,
                to: VideoJobStatus::Failed,
            });
        }
        job.last_error = Some(error);
        job.status = if job.can_retry() {
            job.claimed_at = None;
            VideoJobStatus::Pending
        } else {
            VideoJobStatus::Failed
        };
        job.updated_at = now;
        Ok(job.clone())
    }
}
