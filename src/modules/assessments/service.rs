//! Question authoring and test attempt lifecycle.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, instrument};
use validator::Validate;

use edulife_core::AppError;
use edulife_models::assessments::{
    AnswerSubmission, AttemptError, AttemptStatus, CreateQuestionDto, Question, QuestionOption,
    SnapshotOption, SnapshotQuestion, TestAnswer, TestAttempt,
};
use edulife_models::audit::{actions, NewAuditEntry};
use edulife_models::courses::CatalogError;
use edulife_models::enrollments::EnrollmentError;
use edulife_models::ids::{AnswerId, AttemptId, LessonId, QuestionId, QuestionOptionId, UserId};

use crate::store::Store;

use super::grading::grade_attempt;

/// Used when the lesson does not set its own passing score.
const DEFAULT_PASSING_SCORE: f64 = 60.0;

pub struct AssessmentService {
    store: Arc<dyn Store>,
}

impl AssessmentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Adds a question to a lesson's test. Missing `order_index` appends
    /// after the current highest position.
    #[instrument(skip(self, dto))]
    pub async fn add_question(
        &self,
        lesson_id: LessonId,
        dto: CreateQuestionDto,
    ) -> Result<Question, CatalogError> {
        dto.validate()
            .map_err(|e| CatalogError::Storage(AppError::validation(e.to_string())))?;
        for option in &dto.options {
            option
                .validate()
                .map_err(|e| CatalogError::Storage(AppError::validation(e.to_string())))?;
        }

        self.store
            .find_lesson(lesson_id)
            .await
            .map_err(CatalogError::Storage)?
            .ok_or(CatalogError::LessonNotFound)?;

        let order_index = match dto.order_index {
            Some(index) => index,
            None => {
                let existing = self
                    .store
                    .questions_for_lesson(lesson_id)
                    .await
                    .map_err(CatalogError::Storage)?;
                existing
                    .iter()
                    .map(|(q, _)| q.order_index + 1)
                    .max()
                    .unwrap_or(0)
            }
        };

        let now = Utc::now();
        let question = Question {
            id: QuestionId::new(),
            lesson_id,
            prompt: dto.prompt,
            question_type: dto.question_type,
            points: dto.points,
            case_sensitive: dto.case_sensitive,
            correct_text: dto.correct_text,
            order_index,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let options = dto
            .options
            .into_iter()
            .enumerate()
            .map(|(i, o)| QuestionOption {
                id: QuestionOptionId::new(),
                question_id: question.id,
                text: o.text,
                is_correct: o.is_correct,
                order_index: i as i32,
                created_at: now,
            })
            .collect();

        self.store.insert_question(question, options).await
    }

    /// Starts an attempt, snapshotting the lesson's current questions so
    /// later edits cannot change how this attempt grades.
    #[instrument(skip(self))]
    pub async fn start_attempt(
        &self,
        user_id: UserId,
        lesson_id: LessonId,
    ) -> Result<TestAttempt, AttemptError> {
        let lesson = self
            .store
            .find_lesson(lesson_id)
            .await?
            .ok_or_else(|| AttemptError::Storage(AppError::not_found("Lesson not found")))?;
        self.store
            .find_enrollment(user_id, lesson.course_id)
            .await?
            .ok_or_else(|| AttemptError::Storage(AppError::from(EnrollmentError::NotEnrolled)))?;

        let questions = self.store.questions_for_lesson(lesson_id).await?;
        if questions.is_empty() {
            return Err(AttemptError::NoQuestions);
        }

        let snapshot: Vec<SnapshotQuestion> = questions
            .into_iter()
            .map(|(q, options)| SnapshotQuestion {
                id: q.id,
                question_type: q.question_type,
                prompt: q.prompt,
                points: q.points,
                case_sensitive: q.case_sensitive,
                correct_text: q.correct_text,
                options: options
                    .into_iter()
                    .map(|o| SnapshotOption {
                        id: o.id,
                        text: o.text,
                        is_correct: o.is_correct,
                    })
                    .collect(),
            })
            .collect();
        let total_points = snapshot.iter().map(|q| q.points).sum();
        let questions_snapshot = serde_json::to_string(&snapshot)
            .map_err(|e| AppError::internal_error(format!("Snapshot encoding failed: {}", e)))?;

        let now = Utc::now();
        let expires_at = lesson
            .test_time_limit_seconds
            .map(|limit| now + Duration::seconds(limit as i64));
        let attempt = TestAttempt {
            id: AttemptId::new(),
            user_id,
            lesson_id,
            questions_snapshot,
            total_points,
            passing_score: lesson.test_passing_score.unwrap_or(DEFAULT_PASSING_SCORE),
            earned_points: 0,
            score: 0.0,
            correct_count: 0,
            wrong_count: 0,
            skipped_count: 0,
            passed: false,
            status: AttemptStatus::InProgress,
            started_at: now,
            expires_at,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        let attempt = self.store.insert_attempt(attempt).await?;
        info!(attempt_id = %attempt.id, lesson_id = %lesson_id, "attempt started");
        Ok(attempt)
    }

    /// Grades and completes an in-progress attempt.
    ///
    /// A submission landing after the deadline marks the attempt expired
    /// instead of grading it.
    #[instrument(skip(self, submissions))]
    pub async fn submit_attempt(
        &self,
        user_id: UserId,
        attempt_id: AttemptId,
        submissions: Vec<AnswerSubmission>,
    ) -> Result<TestAttempt, AttemptError> {
        let attempt = self
            .store
            .find_attempt(attempt_id)
            .await?
            .filter(|a| a.user_id == user_id)
            .ok_or(AttemptError::AttemptNotFound)?;
        match attempt.status {
            AttemptStatus::InProgress => {}
            AttemptStatus::Completed => return Err(AttemptError::AttemptAlreadyCompleted),
            AttemptStatus::Expired => return Err(AttemptError::AttemptExpired),
        }

        let now = Utc::now();
        if attempt.is_expired(now) {
            self.store.mark_attempt_expired(attempt_id, now).await?;
            return Err(AttemptError::AttemptExpired);
        }

        let questions = attempt.questions()?;
        let (summary, graded) = grade_attempt(&questions, &submissions, attempt.passing_score);

        let answers = graded
            .into_iter()
            .map(|g| TestAnswer {
                id: AnswerId::new(),
                attempt_id,
                question_id: g.question_id,
                selected_option_ids: g.selected_option_ids,
                text_answer: g.text_answer,
                is_correct: g.is_correct,
                points_awarded: g.points_awarded,
                created_at: now,
            })
            .collect();

        let completed = TestAttempt {
            earned_points: summary.earned_points,
            score: summary.score,
            correct_count: summary.correct_count,
            wrong_count: summary.wrong_count,
            skipped_count: summary.skipped_count,
            passed: summary.passed,
            status: AttemptStatus::Completed,
            completed_at: Some(now),
            updated_at: now,
            ..attempt
        };
        let attempt = self.store.complete_attempt(completed, answers).await?;

        self.store
            .record_audit(
                NewAuditEntry::new(actions::ATTEMPT_SUBMITTED, "test_attempt")
                    .actor(user_id)
                    .entity(attempt.id.0)
                    .detail(format!("score={} passed={}", attempt.score, attempt.passed)),
            )
            .await?;
        info!(attempt_id = %attempt.id, score = attempt.score, passed = attempt.passed, "attempt graded");
        Ok(attempt)
    }

    pub async fn get_attempt(
        &self,
        user_id: UserId,
        attempt_id: AttemptId,
    ) -> Result<TestAttempt, AttemptError> {
        self.store
            .find_attempt(attempt_id)
            .await?
            .filter(|a| a.user_id == user_id)
            .ok_or(AttemptError::AttemptNotFound)
    }
}
