//! Pure grading logic over an attempt's question snapshot.
//!
//! Grading never touches live question rows: it reads only the snapshot
//! captured when the attempt started.

use std::collections::HashSet;

use edulife_core::round2;
use edulife_models::assessments::{
    AnswerSubmission, GradingSummary, QuestionType, SnapshotQuestion,
};
use edulife_models::ids::{QuestionId, QuestionOptionId};

/// One graded question, ready to persist as a `TestAnswer` row.
#[derive(Debug, Clone)]
pub struct GradedAnswer {
    pub question_id: QuestionId,
    pub selected_option_ids: Vec<QuestionOptionId>,
    pub text_answer: Option<String>,
    pub is_correct: bool,
    pub points_awarded: i32,
}

fn is_answered(submission: &AnswerSubmission) -> bool {
    !submission.selected_option_ids.is_empty()
        || submission
            .text_answer
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
}

fn grade_question(question: &SnapshotQuestion, submission: &AnswerSubmission) -> bool {
    match question.question_type {
        // One selected option, and it must be the correct one.
        QuestionType::SingleChoice | QuestionType::TrueFalse => {
            let correct: Vec<QuestionOptionId> = question
                .options
                .iter()
                .filter(|o| o.is_correct)
                .map(|o| o.id)
                .collect();
            submission.selected_option_ids.len() == 1
                && correct == submission.selected_option_ids
        }
        // Exact set equality: extra or missing selections both fail.
        QuestionType::MultipleChoice => {
            let correct: HashSet<QuestionOptionId> = question
                .options
                .iter()
                .filter(|o| o.is_correct)
                .map(|o| o.id)
                .collect();
            let selected: HashSet<QuestionOptionId> =
                submission.selected_option_ids.iter().copied().collect();
            !correct.is_empty() && correct == selected
        }
        QuestionType::FillBlank => {
            let Some(expected) = question.correct_text.as_deref() else {
                return false;
            };
            let Some(given) = submission.text_answer.as_deref() else {
                return false;
            };
            let expected = expected.trim();
            let given = given.trim();
            if question.case_sensitive {
                expected == given
            } else {
                expected.eq_ignore_ascii_case(given)
            }
        }
    }
}

/// Grades a full submission against the snapshot.
///
/// Unanswered questions count as skipped and earn nothing. The score is a
/// percentage rounded to two decimals; `passed` compares it against the
/// attempt's captured passing score.
pub fn grade_attempt(
    questions: &[SnapshotQuestion],
    submissions: &[AnswerSubmission],
    passing_score: f64,
) -> (GradingSummary, Vec<GradedAnswer>) {
    let total_points: i32 = questions.iter().map(|q| q.points).sum();
    let mut earned_points = 0;
    let mut correct_count = 0;
    let mut wrong_count = 0;
    let mut skipped_count = 0;
    let mut graded = Vec::new();

    for question in questions {
        let submission = submissions
            .iter()
            .find(|s| s.question_id == question.id)
            .filter(|s| is_answered(s));
        match submission {
            None => {
                skipped_count += 1;
            }
            Some(submission) => {
                let is_correct = grade_question(question, submission);
                let points_awarded = if is_correct { question.points } else { 0 };
                earned_points += points_awarded;
                if is_correct {
                    correct_count += 1;
                } else {
                    wrong_count += 1;
                }
                graded.push(GradedAnswer {
                    question_id: question.id,
                    selected_option_ids: submission.selected_option_ids.clone(),
                    text_answer: submission.text_answer.clone(),
                    is_correct,
                    points_awarded,
                });
            }
        }
    }

    let score = if total_points > 0 {
        round2(earned_points as f64 / total_points as f64 * 100.0)
    } else {
        0.0
    };
    let summary = GradingSummary {
        earned_points,
        total_points,
        score,
        passed: score >= passing_score,
        correct_count,
        wrong_count,
        skipped_count,
    };
    (summary, graded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edulife_models::assessments::SnapshotOption;

    fn option(correct: bool) -> SnapshotOption {
        SnapshotOption {
            id: QuestionOptionId::new(),
            text: "option".into(),
            is_correct: correct,
        }
    }

    fn single_choice(points: i32) -> SnapshotQuestion {
        SnapshotQuestion {
            id: QuestionId::new(),
            question_type: QuestionType::SingleChoice,
            prompt: "pick one".into(),
            points,
            case_sensitive: false,
            correct_text: None,
            options: vec![option(true), option(false), option(false)],
        }
    }

    fn answer(question: &SnapshotQuestion, ids: Vec<QuestionOptionId>) -> AnswerSubmission {
        AnswerSubmission {
            question_id: question.id,
            selected_option_ids: ids,
            text_answer: None,
        }
    }

    fn correct_ids(question: &SnapshotQuestion) -> Vec<QuestionOptionId> {
        question
            .options
            .iter()
            .filter(|o| o.is_correct)
            .map(|o| o.id)
            .collect()
    }

    #[test]
    fn single_choice_exact_match() {
        let q = single_choice(10);
        let right = answer(&q, correct_ids(&q));
        let (summary, _) = grade_attempt(&[q.clone()], &[right], 50.0);
        assert_eq!(summary.earned_points, 10);
        assert!(summary.passed);

        let wrong = answer(&q, vec![q.options[1].id]);
        let (summary, _) = grade_attempt(&[q], &[wrong], 50.0);
        assert_eq!(summary.earned_points, 0);
        assert_eq!(summary.wrong_count, 1);
    }

    #[test]
    fn multiple_choice_requires_set_equality() {
        let mut q = single_choice(5);
        q.question_type = QuestionType::MultipleChoice;
        q.options = vec![option(true), option(true), option(false)];

        let exact = answer(&q, correct_ids(&q));
        let (summary, _) = grade_attempt(&[q.clone()], &[exact], 50.0);
        assert_eq!(summary.correct_count, 1);

        // Partial selection earns nothing.
        let partial = answer(&q, vec![q.options[0].id]);
        let (summary, _) = grade_attempt(&[q.clone()], &[partial], 50.0);
        assert_eq!(summary.earned_points, 0);

        // Selecting everything earns nothing either.
        let all = answer(&q, q.options.iter().map(|o| o.id).collect());
        let (summary, _) = grade_attempt(&[q], &[all], 50.0);
        assert_eq!(summary.earned_points, 0);
    }

    #[test]
    fn fill_blank_case_handling() {
        let mut q = single_choice(5);
        q.question_type = QuestionType::FillBlank;
        q.options = vec![];
        q.correct_text = Some("Paris".into());

        let mut sub = AnswerSubmission {
            question_id: q.id,
            selected_option_ids: vec![],
            text_answer: Some("  paris ".into()),
        };
        let (summary, _) = grade_attempt(&[q.clone()], &[sub.clone()], 50.0);
        assert_eq!(summary.correct_count, 1);

        q.case_sensitive = true;
        sub.text_answer = Some("paris".into());
        let (summary, _) = grade_attempt(&[q], &[sub], 50.0);
        assert_eq!(summary.wrong_count, 1);
    }

    #[test]
    fn unanswered_questions_are_skipped() {
        let q1 = single_choice(10);
        let q2 = single_choice(10);
        let right = answer(&q1, correct_ids(&q1));
        let (summary, graded) = grade_attempt(&[q1, q2], &[right], 50.0);
        assert_eq!(summary.skipped_count, 1);
        assert_eq!(summary.correct_count, 1);
        assert_eq!(summary.score, 50.0);
        assert!(summary.passed);
        assert_eq!(graded.len(), 1);
    }

    #[test]
    fn score_rounds_to_two_decimals() {
        let q1 = single_choice(1);
        let q2 = single_choice(1);
        let q3 = single_choice(1);
        let right = answer(&q1, correct_ids(&q1));
        let (summary, _) = grade_attempt(&[q1, q2, q3], &[right], 30.0);
        assert_eq!(summary.score, 33.33);
        assert!(summary.passed);
    }

    #[test]
    fn pass_boundary_is_inclusive() {
        let q1 = single_choice(1);
        let q2 = single_choice(1);
        let right = answer(&q1, correct_ids(&q1));
        let (summary, _) = grade_attempt(&[q1, q2], &[right], 50.0);
        assert_eq!(summary.score, 50.0);
        assert!(summary.passed);
    }
}
