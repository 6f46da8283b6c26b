use async_trait::async_trait;

use edulife_core::{AppError, PaginationParams};
use edulife_models::courses::{
    CatalogError, Course, CourseModule, CourseStatus, CourseTree, CourseTreeDeletion, Lesson,
    LessonResource,
};
use edulife_models::ids::{CourseId, LessonId, ModuleId};

/// The course → module → lesson → resource hierarchy.
///
/// Insert methods also maintain the parent's denormalized counters in the
/// same atomic write, and reject duplicate `order_index` values within the
/// parent scope.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fails with [`CatalogError::DuplicateSlug`] on slug collision.
    async fn insert_course(&self, course: Course) -> Result<Course, CatalogError>;

    async fn find_course(&self, id: CourseId) -> Result<Option<Course>, AppError>;

    async fn find_course_by_slug(&self, slug: &str) -> Result<Option<Course>, AppError>;

    async fn update_course_status(
        &self,
        id: CourseId,
        status: CourseStatus,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Course, CatalogError>;

    async fn list_courses(
        &self,
        status: Option<CourseStatus>,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Course>, i64), AppError>;

    async fn insert_module(&self, module: CourseModule) -> Result<CourseModule, CatalogError>;

    async fn find_module(&self, id: ModuleId) -> Result<Option<CourseModule>, AppError>;

    async fn insert_lesson(&self, lesson: Lesson) -> Result<Lesson, CatalogError>;

    async fn find_lesson(&self, id: LessonId) -> Result<Option<Lesson>, AppError>;

    async fn insert_resource(
        &self,
        resource: LessonResource,
    ) -> Result<LessonResource, CatalogError>;

    /// Loads the course with its live children.
    async fn course_tree(&self, id: CourseId) -> Result<CourseTree, CatalogError>;

    /// Applies the soft-delete batch collected by the visitor and zeroes
    /// the course counters, atomically.
    async fn apply_course_deletion(
        &self,
        deletion: &CourseTreeDeletion,
    ) -> Result<(), CatalogError>;
}
