use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::AppError;
use edulife_models::assessments::{
    AttemptError, AttemptStatus, Question, QuestionOption, TestAnswer, TestAttempt,
};
use edulife_models::courses::CatalogError;
use edulife_models::ids::{AttemptId, LessonId};

use super::{is_unique_violation, storage_error, PostgresStore};
use crate::store::ports::AssessmentStore;

fn attempt_storage(e: sqlx::Error) -> AttemptError {
    AttemptError::Storage(storage_error(e))
}

#[async_trait]
impl AssessmentStore for PostgresStore {
    async fn insert_question(
        &self,
        question: Question,
        options: Vec<QuestionOption>,
    ) -> Result<Question, CatalogError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| CatalogError::Storage(storage_error(e)))?;

        let inserted = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions
                (id, lesson_id, prompt, question_type, points, case_sensitive,
                 correct_text, order_index)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(question.id)
        .bind(question.lesson_id)
        .bind(question.prompt)
        .bind(question.question_type)
        .bind(question.points)
        .bind(question.case_sensitive)
        .bind(question.correct_text)
        .bind(question.order_index)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CatalogError::DuplicateOrderIndex {
                    index: question.order_index,
                }
            } else {
                CatalogError::Storage(storage_error(e))
            }
        })?;

        for option in options {
            sqlx::query(
                r#"
                INSERT INTO question_options (id, question_id, text, is_correct, order_index)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(option.id)
            .bind(option.question_id)
            .bind(option.text)
            .bind(option.is_correct)
            .bind(option.order_index)
            .execute(&mut *tx)
            .await
            .map_err(|e| CatalogError::Storage(storage_error(e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| CatalogError::Storage(storage_error(e)))?;
        Ok(inserted)
    }

    async fn questions_for_lesson(
        &self,
        lesson_id: LessonId,
    ) -> Result<Vec<(Question, Vec<QuestionOption>)>, AppError> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT * FROM questions
            WHERE lesson_id = $1 AND deleted_at IS NULL
            ORDER BY order_index
            "#,
        )
        .bind(lesson_id)
        .fetch_all(self.pool())
        .await
        .map_err(storage_error)?;

        let options = sqlx::query_as::<_, QuestionOption>(
            r#"
            SELECT o.* FROM question_options o
            JOIN questions q ON q.id = o.question_id
            WHERE q.lesson_id = $1 AND q.deleted_at IS NULL
            ORDER BY o.order_index
            "#,
        )
        .bind(lesson_id)
        .fetch_all(self.pool())
        .await
        .map_err(storage_error)?;

        Ok(questions
            .into_iter()
            .map(|question| {
                let question_options = options
                    .iter()
                    .filter(|o| o.question_id == question.id)
                    .cloned()
                    .collect();
                (question, question_options)
            })
            .collect())
    }

    async fn insert_attempt(&self, attempt: TestAttempt) -> Result<TestAttempt, AppError> {
        sqlx::query_as::<_, TestAttempt>(
            r#"
            INSERT INTO test_attempts
                (id, user_id, lesson_id, questions_snapshot, total_points, passing_score,
                 status, started_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(attempt.id)
        .bind(attempt.user_id)
        .bind(attempt.lesson_id)
        .bind(attempt.questions_snapshot)
        .bind(attempt.total_points)
        .bind(attempt.passing_score)
        .bind(attempt.status)
        .bind(attempt.started_at)
        .bind(attempt.expires_at)
        .fetch_one(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn find_attempt(&self, id: AttemptId) -> Result<Option<TestAttempt>, AppError> {
        sqlx::query_as::<_, TestAttempt>("SELECT * FROM test_attempts WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(storage_error)
    }

    async fn complete_attempt(
        &self,
        attempt: TestAttempt,
        answers: Vec<TestAnswer>,
    ) -> Result<TestAttempt, AttemptError> {
        let mut tx = self.pool().begin().await.map_err(attempt_storage)?;

        let updated = sqlx::query_as::<_, TestAttempt>(
            r#"
            UPDATE test_attempts
            SET earned_points = $2, score = $3, correct_count = $4, wrong_count = $5,
                skipped_count = $6, passed = $7, status = $8, completed_at = $9,
                updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(attempt.id)
        .bind(attempt.earned_points)
        .bind(attempt.score)
        .bind(attempt.correct_count)
        .bind(attempt.wrong_count)
        .bind(attempt.skipped_count)
        .bind(attempt.passed)
        .bind(attempt.status)
        .bind(attempt.completed_at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(attempt_storage)?
        .ok_or(AttemptError::AttemptNotFound)?;

        for answer in answers {
            let option_ids: Vec<uuid::Uuid> =
                answer.selected_option_ids.iter().map(|id| id.0).collect();
            sqlx::query(
                r#"
                INSERT INTO test_answers
                    (id, attempt_id, question_id, selected_option_ids, text_answer,
                     is_correct, points_awarded)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(answer.id)
            .bind(answer.attempt_id)
            .bind(answer.question_id)
            .bind(&option_ids)
            .bind(answer.text_answer)
            .bind(answer.is_correct)
            .bind(answer.points_awarded)
            .execute(&mut *tx)
            .await
            .map_err(attempt_storage)?;
        }

        tx.commit().await.map_err(attempt_storage)?;
        Ok(updated)
    }

    async fn mark_attempt_expired(
        &self,
        id: AttemptId,
        now: DateTime<Utc>,
    ) -> Result<TestAttempt, AttemptError> {
        sqlx::query_as::<_, TestAttempt>(
            r#"
            UPDATE test_attempts SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(AttemptStatus::Expired)
        .bind(now)
        .fetch_optional(self.pool())
        .await
        .map_err(attempt_storage)?
        .ok_or(AttemptError::AttemptNotFound)
    }
}
