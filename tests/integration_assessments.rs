mod common;

use common::{memory_store, progress_service, register_user, seed_course};
use chrono::Utc;
use edulife::modules::assessments::AssessmentService;
use edulife_models::assessments::{
    AnswerSubmission, AttemptError, AttemptStatus, CreateOptionDto, CreateQuestionDto,
    QuestionType,
};
use edulife_models::ids::LessonId;
use edulife_models::users::UserRole;

fn choice_question(prompt: &str, points: i32) -> CreateQuestionDto {
    CreateQuestionDto {
        prompt: prompt.into(),
        question_type: QuestionType::SingleChoice,
        points,
        case_sensitive: false,
        correct_text: None,
        order_index: None,
        options: vec![
            CreateOptionDto { text: "Right".into(), is_correct: true },
            CreateOptionDto { text: "Wrong".into(), is_correct: false },
        ],
    }
}

async fn setup() -> (
    std::sync::Arc<dyn edulife::store::Store>,
    edulife_models::ids::UserId,
    LessonId,
) {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let student = register_user(&store, "student@example.com", UserRole::Student).await;
    let (course, _, lessons) = seed_course(&store, teacher.id, 0, 1).await;
    progress_service(store.clone())
        .enroll(student.id, course.id)
        .await
        .unwrap();
    (store, student.id, lessons[0])
}

#[tokio::test]
async fn questions_get_sequential_positions() {
    let (store, _, lesson_id) = setup().await;
    let assessments = AssessmentService::new(store);

    let q1 = assessments
        .add_question(lesson_id, choice_question("First?", 5))
        .await
        .unwrap();
    let q2 = assessments
        .add_question(lesson_id, choice_question("Second?", 5))
        .await
        .unwrap();
    assert_eq!(q1.order_index, 0);
    assert_eq!(q2.order_index, 1);
}

#[tokio::test]
async fn attempts_need_questions() {
    let (store, student_id, lesson_id) = setup().await;
    let assessments = AssessmentService::new(store);

    let err = assessments
        .start_attempt(student_id, lesson_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AttemptError::NoQuestions));
}

#[tokio::test]
async fn grading_uses_the_snapshot_not_live_questions() {
    let (store, student_id, lesson_id) = setup().await;
    let assessments = AssessmentService::new(store);

    assessments
        .add_question(lesson_id, choice_question("Only one?", 10))
        .await
        .unwrap();
    let attempt = assessments
        .start_attempt(student_id, lesson_id)
        .await
        .unwrap();
    assert_eq!(attempt.total_points, 10);

    // Added after the snapshot; must not count toward this attempt.
    assessments
        .add_question(lesson_id, choice_question("Late addition?", 90))
        .await
        .unwrap();

    let questions = attempt.questions().unwrap();
    let correct_option = questions[0]
        .options
        .iter()
        .find(|o| o.is_correct)
        .unwrap()
        .id;
    let graded = assessments
        .submit_attempt(
            student_id,
            attempt.id,
            vec![AnswerSubmission {
                question_id: questions[0].id,
                selected_option_ids: vec![correct_option],
                text_answer: None,
            }],
        )
        .await
        .unwrap();

    assert_eq!(graded.total_points, 10);
    assert_eq!(graded.earned_points, 10);
    assert_eq!(graded.score, 100.0);
    assert!(graded.passed);
    assert_eq!(graded.status, AttemptStatus::Completed);
}

#[tokio::test]
async fn skipped_questions_count_against_the_score() {
    let (store, student_id, lesson_id) = setup().await;
    let assessments = AssessmentService::new(store);

    assessments
        .add_question(lesson_id, choice_question("One?", 10))
        .await
        .unwrap();
    assessments
        .add_question(lesson_id, choice_question("Two?", 10))
        .await
        .unwrap();

    let attempt = assessments
        .start_attempt(student_id, lesson_id)
        .await
        .unwrap();
    let questions = attempt.questions().unwrap();
    let correct = questions[0].options.iter().find(|o| o.is_correct).unwrap().id;

    let graded = assessments
        .submit_attempt(
            student_id,
            attempt.id,
            vec![AnswerSubmission {
                question_id: questions[0].id,
                selected_option_ids: vec![correct],
                text_answer: None,
            }],
        )
        .await
        .unwrap();

    assert_eq!(graded.correct_count, 1);
    assert_eq!(graded.skipped_count, 1);
    // 50% meets the lesson's 50% passing score.
    assert_eq!(graded.score, 50.0);
    assert!(graded.passed);
}

#[tokio::test]
async fn double_submission_is_rejected() {
    let (store, student_id, lesson_id) = setup().await;
    let assessments = AssessmentService::new(store);
    assessments
        .add_question(lesson_id, choice_question("One?", 10))
        .await
        .unwrap();

    let attempt = assessments
        .start_attempt(student_id, lesson_id)
        .await
        .unwrap();
    assessments
        .submit_attempt(student_id, attempt.id, vec![])
        .await
        .unwrap();

    let err = assessments
        .submit_attempt(student_id, attempt.id, vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, AttemptError::AttemptAlreadyCompleted));
}

#[tokio::test]
async fn expired_attempts_cannot_be_submitted() {
    let (store, student_id, lesson_id) = setup().await;
    let assessments = AssessmentService::new(store.clone());
    assessments
        .add_question(lesson_id, choice_question("One?", 10))
        .await
        .unwrap();

    let attempt = assessments
        .start_attempt(student_id, lesson_id)
        .await
        .unwrap();
    store
        .mark_attempt_expired(attempt.id, Utc::now())
        .await
        .unwrap();

    let err = assessments
        .submit_attempt(student_id, attempt.id, vec![])
        .await
        .unwrap_err();
    assert!(matches!(err, AttemptError::AttemptExpired));
}
