//! Course catalog models: the Course → Module → Lesson → Resource
//! containment hierarchy.
//!
//! Each child carries an `order_index` unique within its parent scope (not
//! globally). `modules_count`/`lessons_count` and the review aggregates are
//! denormalized and recomputed inside the same atomic operation that
//! mutates the underlying rows; client-supplied values are never trusted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use edulife_core::AppError;

use crate::ids::{CourseId, LessonId, ModuleId, ResourceId, UserId};

/// Course publication status, stored as the `course_status` Postgres enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "course_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Course {
    pub id: CourseId,
    pub teacher_id: UserId,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    /// Price in integer minor units.
    pub price: i64,
    pub status: CourseStatus,
    pub modules_count: i32,
    pub lessons_count: i32,
    pub students_count: i32,
    pub rating_avg: f64,
    pub ratings_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Course {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourseModule {
    pub id: ModuleId,
    pub course_id: CourseId,
    pub title: String,
    pub order_index: i32,
    pub lessons_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Lesson {
    pub id: LessonId,
    pub module_id: ModuleId,
    pub course_id: CourseId,
    pub title: String,
    pub order_index: i32,
    pub video_duration_seconds: Option<i32>,
    /// Passing score for the lesson's test, as a percentage.
    pub test_passing_score: Option<f64>,
    /// Time limit for the lesson's test, in seconds.
    pub test_time_limit_seconds: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LessonResource {
    pub id: ResourceId,
    pub lesson_id: LessonId,
    pub title: String,
    pub url: String,
    pub resource_type: String,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A course with its live (non-deleted) children, used by the soft-delete
/// visitor and by attempt snapshots.
#[derive(Debug, Clone)]
pub struct CourseTree {
    pub course: Course,
    pub modules: Vec<ModuleNode>,
}

#[derive(Debug, Clone)]
pub struct ModuleNode {
    pub module: CourseModule,
    pub lessons: Vec<LessonNode>,
}

#[derive(Debug, Clone)]
pub struct LessonNode {
    pub lesson: Lesson,
    pub resources: Vec<LessonResource>,
}

/// The id sets collected by the soft-delete visitor, applied as one atomic
/// batch.
#[derive(Debug, Clone)]
pub struct CourseTreeDeletion {
    pub course_id: CourseId,
    pub module_ids: Vec<ModuleId>,
    pub lesson_ids: Vec<LessonId>,
    pub resource_ids: Vec<ResourceId>,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCourseDto {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateModuleDto {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    /// Position within the course; appended at the end when omitted.
    pub order_index: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLessonDto {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub order_index: Option<i32>,
    #[validate(range(min = 0))]
    pub video_duration_seconds: Option<i32>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub test_passing_score: Option<f64>,
    #[validate(range(min = 1))]
    pub test_time_limit_seconds: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateResourceDto {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(url)]
    pub url: String,
    #[validate(length(min = 1, max = 50))]
    pub resource_type: String,
    pub order_index: Option<i32>,
}

/// Named error kinds for catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Course not found")]
    CourseNotFound,
    #[error("Module not found")]
    ModuleNotFound,
    #[error("Lesson not found")]
    LessonNotFound,
    #[error("A course with this slug already exists")]
    DuplicateSlug,
    #[error("Position {index} is already taken in this scope")]
    DuplicateOrderIndex { index: i32 },
    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::CourseNotFound
            | CatalogError::ModuleNotFound
            | CatalogError::LessonNotFound => AppError::not_found(err.to_string()),
            CatalogError::DuplicateSlug | CatalogError::DuplicateOrderIndex { .. } => {
                AppError::conflict(err.to_string())
            }
            CatalogError::Storage(inner) => inner,
        }
    }
}
