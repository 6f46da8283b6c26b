use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::AppError;
use edulife_models::assessments::{
    AttemptError, Question, QuestionOption, TestAnswer, TestAttempt,
};
use edulife_models::courses::CatalogError;
use edulife_models::ids::{AttemptId, LessonId};

/// Question authoring and test attempts.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// Inserts a question with its options. Fails with
    /// [`CatalogError::DuplicateOrderIndex`] within the lesson scope.
    async fn insert_question(
        &self,
        question: Question,
        options: Vec<QuestionOption>,
    ) -> Result<Question, CatalogError>;

    /// Live questions for a lesson with their options, ordered by
    /// `order_index`.
    async fn questions_for_lesson(
        &self,
        lesson_id: LessonId,
    ) -> Result<Vec<(Question, Vec<QuestionOption>)>, AppError>;

    async fn insert_attempt(&self, attempt: TestAttempt) -> Result<TestAttempt, AppError>;

    async fn find_attempt(&self, id: AttemptId) -> Result<Option<TestAttempt>, AppError>;

    /// Writes the graded attempt and its answers atomically.
    async fn complete_attempt(
        &self,
        attempt: TestAttempt,
        answers: Vec<TestAnswer>,
    ) -> Result<TestAttempt, AttemptError>;

    async fn mark_attempt_expired(
        &self,
        id: AttemptId,
        now: DateTime<Utc>,
    ) -> Result<TestAttempt, AttemptError>;
}
