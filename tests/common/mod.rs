#![allow(dead_code)]

use std::sync::Arc;

use edulife::modules::auth::AuthService;
use edulife::modules::catalog::CatalogService;
use edulife::modules::progress::ProgressService;
use edulife::store::{MemoryStore, Store};
use edulife_config::{JwtConfig, ProgressConfig, SecurityConfig};
use edulife_models::courses::{Course, CreateCourseDto, CreateLessonDto, CreateModuleDto};
use edulife_models::ids::{LessonId, ModuleId, UserId};
use edulife_models::users::{RegisterDto, User, UserRole};

pub const TEST_PASSWORD: &str = "correct-horse-battery";

pub fn memory_store() -> Arc<dyn Store> {
    Arc::new(MemoryStore::new())
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret".into(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604_800,
    }
}

pub fn auth_service(store: Arc<dyn Store>) -> AuthService {
    AuthService::new(store, jwt_config(), SecurityConfig::default())
}

pub fn progress_service(store: Arc<dyn Store>) -> ProgressService {
    ProgressService::new(store, ProgressConfig::default())
}

pub async fn register_user(store: &Arc<dyn Store>, email: &str, role: UserRole) -> User {
    auth_service(store.clone())
        .register(
            RegisterDto {
                email: Some(email.to_string()),
                phone: None,
                password: TEST_PASSWORD.to_string(),
            },
            role,
        )
        .await
        .expect("user registration failed")
}

/// Publishes a course with one module and `lessons` lessons, each carrying
/// a 100-second video and a 50% test passing score.
pub async fn seed_course(
    store: &Arc<dyn Store>,
    teacher: UserId,
    price: i64,
    lessons: usize,
) -> (Course, ModuleId, Vec<LessonId>) {
    let catalog = CatalogService::new(store.clone());
    let course = catalog
        .create_course(
            teacher,
            CreateCourseDto {
                title: format!("Course {}", uuid::Uuid::new_v4().simple()),
                description: None,
                price,
            },
        )
        .await
        .expect("course creation failed");
    let module = catalog
        .add_module(
            course.id,
            CreateModuleDto {
                title: "Module 1".into(),
                order_index: None,
            },
        )
        .await
        .expect("module creation failed");

    let mut lesson_ids = Vec::new();
    for i in 0..lessons {
        let lesson = catalog
            .add_lesson(
                module.id,
                CreateLessonDto {
                    title: format!("Lesson {}", i + 1),
                    order_index: None,
                    video_duration_seconds: Some(100),
                    test_passing_score: Some(50.0),
                    test_time_limit_seconds: None,
                },
            )
            .await
            .expect("lesson creation failed");
        lesson_ids.push(lesson.id);
    }

    let course = catalog
        .publish_course(teacher, course.id)
        .await
        .expect("publish failed");
    (course, module.id, lesson_ids)
}
