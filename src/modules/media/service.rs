//! Video processing job queue.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, instrument};

use edulife_core::AppError;
use edulife_models::ids::{LessonId, VideoJobId};
use edulife_models::media::{MediaError, VideoJobStatus, VideoProcessingJob};

use crate::store::Store;

const DEFAULT_MAX_ATTEMPTS: i32 = 3;
const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct MediaService {
    store: Arc<dyn Store>,
}

impl MediaService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Queues a lesson video for processing.
    #[instrument(skip(self))]
    pub async fn enqueue(
        &self,
        lesson_id: LessonId,
        source_url: String,
    ) -> Result<VideoProcessingJob, AppError> {
        self.store
            .find_lesson(lesson_id)
            .await?
            .ok_or_else(|| AppError::not_found("Lesson not found"))?;
        let now = Utc::now();
        let job = self
            .store
            .insert_video_job(VideoProcessingJob {
                id: VideoJobId::new(),
                lesson_id,
                source_url,
                output_url: None,
                status: VideoJobStatus::Pending,
                attempts: 0,
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                last_error: None,
                claimed_at: None,
                completed_at: None,
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(job_id = %job.id, lesson_id = %lesson_id, "video job queued");
        Ok(job)
    }

    pub async fn claim_next(&self) -> Result<Option<VideoProcessingJob>, AppError> {
        self.store.claim_next_video_job(Utc::now()).await
    }

    pub async fn advance(
        &self,
        job_id: VideoJobId,
        next: VideoJobStatus,
        output_url: Option<String>,
    ) -> Result<VideoProcessingJob, MediaError> {
        self.store
            .advance_video_job(job_id, next, output_url, Utc::now())
            .await
    }

    /// Records a stage failure. The job requeues while attempts remain.
    pub async fn fail(
        &self,
        job_id: VideoJobId,
        error: String,
    ) -> Result<VideoProcessingJob, MediaError> {
        self.store.fail_video_job(job_id, error, Utc::now()).await
    }

    pub async fn get_job(&self, job_id: VideoJobId) -> Result<VideoProcessingJob, MediaError> {
        self.store
            .find_video_job(job_id)
            .await?
            .ok_or(MediaError::JobNotFound)
    }

    /// Worker loop: claims jobs and walks each through the pipeline.
    ///
    /// The `process` callback does the actual stage work (download,
    /// transcode, upload) and returns the output URL; any error requeues
    /// the job until its attempts run out.
    pub async fn run_worker<F, Fut>(&self, process: F) -> Result<(), AppError>
    where
        F: Fn(VideoProcessingJob, VideoJobStatus) -> Fut,
        Fut: std::future::Future<Output = Result<Option<String>, anyhow::Error>>,
    {
        loop {
            let Some(job) = self.claim_next().await? else {
                tokio::time::sleep(IDLE_POLL_INTERVAL).await;
                continue;
            };
            info!(job_id = %job.id, attempt = job.attempts, "processing video job");
            if let Err(e) = self.run_pipeline(job, &process).await {
                error!(error = %e, "video job stage failed");
            }
        }
    }

    async fn run_pipeline<F, Fut>(
        &self,
        mut job: VideoProcessingJob,
        process: &F,
    ) -> Result<(), AppError>
    where
        F: Fn(VideoProcessingJob, VideoJobStatus) -> Fut,
        Fut: std::future::Future<Output = Result<Option<String>, anyhow::Error>>,
    {
        // Claiming already moved the job to downloading.
        let stages = [
            VideoJobStatus::Transcoding,
            VideoJobStatus::Uploading,
            VideoJobStatus::Completed,
        ];
        for next in stages {
            match process(job.clone(), job.status).await {
                Ok(output_url) => {
                    job = self.advance(job.id, next, output_url).await?;
                }
                Err(e) => {
                    self.fail(job.id, e.to_string()).await?;
                    return Ok(());
                }
            }
        }
        info!(job_id = %job.id, "video job completed");
        Ok(())
    }
}
