//! Question, test attempt, and grading models.
//!
//! A [`TestAttempt`] snapshots the lesson's question set as JSON when it
//! starts, so later edits to questions never retroactively change
//! historical grading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use edulife_core::AppError;

use crate::ids::{AnswerId, AttemptId, LessonId, QuestionId, QuestionOptionId, UserId};

/// Question kind, stored as the `question_type` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "question_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    TrueFalse,
    FillBlank,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Question {
    pub id: QuestionId,
    pub lesson_id: LessonId,
    pub prompt: String,
    pub question_type: QuestionType,
    pub points: i32,
    /// Whether fill-blank answers are compared case-sensitively.
    pub case_sensitive: bool,
    /// Expected answer for fill-blank questions.
    pub correct_text: Option<String>,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct QuestionOption {
    pub id: QuestionOptionId,
    pub question_id: QuestionId,
    pub text: String,
    pub is_correct: bool,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

/// A question as captured into an attempt snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotQuestion {
    pub id: QuestionId,
    pub question_type: QuestionType,
    pub prompt: String,
    pub points: i32,
    pub case_sensitive: bool,
    pub correct_text: Option<String>,
    pub options: Vec<SnapshotOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotOption {
    pub id: QuestionOptionId,
    pub text: String,
    pub is_correct: bool,
}

/// Attempt lifecycle, stored as the `attempt_status` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "attempt_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
    Expired,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TestAttempt {
    pub id: AttemptId,
    pub user_id: UserId,
    pub lesson_id: LessonId,
    /// JSON-serialized `Vec<SnapshotQuestion>` captured at start time.
    pub questions_snapshot: String,
    pub total_points: i32,
    pub passing_score: f64,
    pub earned_points: i32,
    pub score: f64,
    pub correct_count: i32,
    pub wrong_count: i32,
    pub skipped_count: i32,
    pub passed: bool,
    pub status: AttemptStatus,
    pub started_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TestAttempt {
    pub fn questions(&self) -> Result<Vec<SnapshotQuestion>, AppError> {
        serde_json::from_str(&self.questions_snapshot)
            .map_err(|e| AppError::internal_error(format!("Corrupt attempt snapshot: {}", e)))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// One graded answer within an attempt.
#[derive(Debug, Clone, Serialize)]
pub struct TestAnswer {
    pub id: AnswerId,
    pub attempt_id: AttemptId,
    pub question_id: QuestionId,
    pub selected_option_ids: Vec<QuestionOptionId>,
    pub text_answer: Option<String>,
    pub is_correct: bool,
    pub points_awarded: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct CreateQuestionDto {
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    pub question_type: QuestionType,
    #[validate(range(min = 1))]
    pub points: i32,
    #[serde(default)]
    pub case_sensitive: bool,
    pub correct_text: Option<String>,
    pub order_index: Option<i32>,
    #[serde(default)]
    pub options: Vec<CreateOptionDto>,
}

#[derive(Debug, Clone, Deserialize, validator::Validate)]
pub struct CreateOptionDto {
    #[validate(length(min = 1, max = 1000))]
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// An answer as submitted by the student.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerSubmission {
    pub question_id: QuestionId,
    #[serde(default)]
    pub selected_option_ids: Vec<QuestionOptionId>,
    pub text_answer: Option<String>,
}

/// Totals produced by grading an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradingSummary {
    pub earned_points: i32,
    pub total_points: i32,
    pub score: f64,
    pub passed: bool,
    pub correct_count: i32,
    pub wrong_count: i32,
    pub skipped_count: i32,
}

/// Named error kinds for test attempts.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("Attempt not found")]
    AttemptNotFound,
    #[error("Attempt has expired")]
    AttemptExpired,
    #[error("Attempt is already completed")]
    AttemptAlreadyCompleted,
    #[error("Lesson has no test questions")]
    NoQuestions,
    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<AttemptError> for AppError {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::AttemptNotFound => AppError::not_found(err.to_string()),
            AttemptError::AttemptExpired | AttemptError::AttemptAlreadyCompleted => {
                AppError::conflict(err.to_string())
            }
            AttemptError::NoQuestions => AppError::validation(err.to_string()),
            AttemptError::Storage(inner) => inner,
        }
    }
}
