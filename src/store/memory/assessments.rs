use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::AppError;
use edulife_models::assessments::{
    AttemptError, AttemptStatus, Question, QuestionOption, TestAnswer, TestAttempt,
};
use edulife_models::courses::CatalogError;
use edulife_models::ids::{AttemptId, LessonId};

use super::MemoryStore;
use crate::store::ports::AssessmentStore;

#[async_trait]
impl AssessmentStore for MemoryStore {
    async fn insert_question(
        &self,
        question: Question,
        options: Vec<QuestionOption>,
    ) -> Result<Question, CatalogError> {
        let mut inner = self.lock();
        if !inner
            .lessons
            .get(&question.lesson_id)
            .is_some_and(|l| l.deleted_at.is_none())
        {
            return Err(CatalogError::LessonNotFound);
        }
        if inner.questions.values().any(|q| {
            q.deleted_at.is_none()
                && q.lesson_id == question.lesson_id
                && q.order_index == question.order_index
        }) {
            return Err(CatalogError::DuplicateOrderIndex {
                index: question.order_index,
            });
        }
        inner.questions.insert(question.id, question.clone());
        for option in options {
            inner.question_options.insert(option.id, option);
        }
        Ok(question)
    }

    async fn questions_for_lesson(
        &self,
        lesson_id: LessonId,
    ) -> Result<Vec<(Question, Vec<QuestionOption>)>, AppError> {
        let inner = self.lock();
        let mut questions: Vec<Question> = inner
            .questions
            .values()
            .filter(|q| q.deleted_at.is_none() && q.lesson_id == lesson_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.order_index);

        Ok(questions
            .into_iter()
            .map(|question| {
                let mut options: Vec<QuestionOption> = inner
                    .question_options
                    .values()
                    .filter(|o| o.question_id == question.id)
                    .cloned()
                    .collect();
                options.sort_by_key(|o| o.order_index);
                (question, options)
            })
            .collect())
    }

    async fn insert_attempt(&self, attempt: TestAttempt) -> Result<TestAttempt, AppError> {
        self.lock().attempts.insert(attempt.id, attempt.clone());
        Ok(attempt)
    }

    async fn find_attempt(&self, id: AttemptId) -> Result<Option<TestAttempt>, AppError> {
        Ok(self.lock().attempts.get(&id).cloned())
    }

    async fn complete_attempt(
        &self,
        attempt: TestAttempt,
        answers: Vec<TestAnswer>,
    ) -> Result<TestAttempt, AttemptError> {
        let mut inner = self.lock();
        if !inner.attempts.contains_key(&attempt.id) {
            return Err(AttemptError::AttemptNotFound);
        }
        inner.attempts.insert(attempt.id, attempt.clone());
        for answer in answers {
            inner.answers.insert(answer.id, answer);
        }
        Ok(attempt)
    }

    async fn mark_attempt_expired(
        &self,
        id: AttemptId,
        now: DateTime<Utc>,
    ) -> Result<TestAttempt, AttemptError> {
        let mut inner = self.lock();
        let attempt = inner
            .attempts
            .get_mut(&id)
            .ok_or(AttemptError::AttemptNotFound)?;
        attempt.status = AttemptStatus::Expired;
        attempt.updated_at = now;
        Ok(attempt.clone())
    }
}
