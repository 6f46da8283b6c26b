//! Video processing job models.
//!
//! Jobs move through a fixed pipeline: pending → downloading → transcoding
//! → uploading → completed, with failed reachable from any in-flight stage.
//! A failed job returns to pending while `attempts < max_attempts`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use edulife_core::AppError;

use crate::ids::{LessonId, VideoJobId};

/// Pipeline stage, stored as the `video_job_status` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "video_job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VideoJobStatus {
    Pending,
    Downloading,
    Transcoding,
    Uploading,
    Completed,
    Failed,
}

impl VideoJobStatus {
    pub fn can_transition_to(self, next: VideoJobStatus) -> bool {
        use VideoJobStatus::*;
        matches!(
            (self, next),
            (Pending, Downloading)
                | (Downloading, Transcoding)
                | (Transcoding, Uploading)
                | (Uploading, Completed)
                | (Downloading, Failed)
                | (Transcoding, Failed)
                | (Uploading, Failed)
                | (Failed, Pending)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == VideoJobStatus::Completed
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VideoJobStatus::Pending => "pending",
            VideoJobStatus::Downloading => "downloading",
            VideoJobStatus::Transcoding => "transcoding",
            VideoJobStatus::Uploading => "uploading",
            VideoJobStatus::Completed => "completed",
            VideoJobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for VideoJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct VideoProcessingJob {
    pub id: VideoJobId,
    pub lesson_id: LessonId,
    pub source_url: String,
    pub output_url: Option<String>,
    pub status: VideoJobStatus,
    pub attempts: i32,
    pub max_attempts: i32,
    pub last_error: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoProcessingJob {
    pub fn can_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }
}

/// Named error kinds for the video job queue.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Video job not found")]
    JobNotFound,
    #[error("Cannot move video job from {from} to {to}")]
    InvalidTransition { from: VideoJobStatus, to: VideoJobStatus },
    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::JobNotFound => AppError::not_found(err.to_string()),
            MediaError::InvalidTransition { .. } => AppError::conflict(err.to_string()),
            MediaError::Storage(inner) => inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_transitions() {
        use VideoJobStatus::*;
        assert!(Pending.can_transition_to(Downloading));
        assert!(Downloading.can_transition_to(Transcoding));
        assert!(Transcoding.can_transition_to(Uploading));
        assert!(Uploading.can_transition_to(Completed));
        assert!(Transcoding.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Failed));
    }
}
