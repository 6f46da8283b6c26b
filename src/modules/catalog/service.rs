//! Course catalog: authoring the course tree and soft-deleting it.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use edulife_core::{AppError, PaginationParams};
use edulife_models::audit::{actions, NewAuditEntry};
use edulife_models::courses::{
    CatalogError, Course, CourseModule, CourseStatus, CourseTree, CourseTreeDeletion,
    CreateCourseDto, CreateLessonDto, CreateModuleDto, CreateResourceDto, Lesson, LessonResource,
};
use edulife_models::ids::{CourseId, LessonId, ModuleId, ResourceId, UserId};
use edulife_models::roles::generate_slug;

use crate::store::Store;

pub struct CatalogService {
    store: Arc<dyn Store>,
}

fn invalid(e: validator::ValidationErrors) -> CatalogError {
    CatalogError::Storage(AppError::validation(e.to_string()))
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, dto))]
    pub async fn create_course(
        &self,
        teacher_id: UserId,
        dto: CreateCourseDto,
    ) -> Result<Course, CatalogError> {
        dto.validate().map_err(invalid)?;
        let now = Utc::now();

        // Uniquify up front; the store's unique index still backs races.
        let mut slug = generate_slug(&dto.title);
        if self.store.find_course_by_slug(&slug).await?.is_some() {
            slug = format!("{}_{}", slug, &Uuid::new_v4().simple().to_string()[..8]);
        }

        let course = self
            .store
            .insert_course(Course {
                id: CourseId::new(),
                teacher_id,
                title: dto.title,
                slug,
                description: dto.description,
                price: dto.price,
                status: CourseStatus::Draft,
                modules_count: 0,
                lessons_count: 0,
                students_count: 0,
                rating_avg: 0.0,
                ratings_count: 0,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            })
            .await?;

        self.store
            .record_audit(
                NewAuditEntry::new(actions::COURSE_CREATED, "course")
                    .actor(teacher_id)
                    .entity(course.id.0),
            )
            .await?;
        info!(course_id = %course.id, slug = %course.slug, "course created");
        Ok(course)
    }

    #[instrument(skip(self))]
    pub async fn publish_course(
        &self,
        actor_id: UserId,
        id: CourseId,
    ) -> Result<Course, CatalogError> {
        let course = self
            .store
            .update_course_status(id, CourseStatus::Published, Utc::now())
            .await?;
        self.store
            .record_audit(
                NewAuditEntry::new(actions::COURSE_PUBLISHED, "course")
                    .actor(actor_id)
                    .entity(id.0),
            )
            .await?;
        Ok(course)
    }

    pub async fn archive_course(&self, id: CourseId) -> Result<Course, CatalogError> {
        self.store
            .update_course_status(id, CourseStatus::Archived, Utc::now())
            .await
    }

    #[instrument(skip(self, dto))]
    pub async fn add_module(
        &self,
        course_id: CourseId,
        dto: CreateModuleDto,
    ) -> Result<CourseModule, CatalogError> {
        dto.validate().map_err(invalid)?;
        let now = Utc::now();

        let order_index = match dto.order_index {
            Some(index) => index,
            None => self.next_module_index(course_id).await?,
        };
        self.store
            .insert_module(CourseModule {
                id: ModuleId::new(),
                course_id,
                title: dto.title,
                order_index,
                lessons_count: 0,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            })
            .await
    }

    #[instrument(skip(self, dto))]
    pub async fn add_lesson(
        &self,
        module_id: ModuleId,
        dto: CreateLessonDto,
    ) -> Result<Lesson, CatalogError> {
        dto.validate().map_err(invalid)?;
        let now = Utc::now();

        let module = self
            .store
            .find_module(module_id)
            .await?
            .ok_or(CatalogError::ModuleNotFound)?;
        let order_index = match dto.order_index {
            Some(index) => index,
            None => self.next_lesson_index(module.course_id, module_id).await?,
        };
        self.store
            .insert_lesson(Lesson {
                id: LessonId::new(),
                module_id,
                course_id: module.course_id,
                title: dto.title,
                order_index,
                video_duration_seconds: dto.video_duration_seconds,
                test_passing_score: dto.test_passing_score,
                test_time_limit_seconds: dto.test_time_limit_seconds,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            })
            .await
    }

    #[instrument(skip(self, dto))]
    pub async fn add_resource(
        &self,
        lesson_id: LessonId,
        dto: CreateResourceDto,
    ) -> Result<LessonResource, CatalogError> {
        dto.validate().map_err(invalid)?;
        let now = Utc::now();

        let lesson = self
            .store
            .find_lesson(lesson_id)
            .await?
            .ok_or(CatalogError::LessonNotFound)?;
        let order_index = match dto.order_index {
            Some(index) => index,
            None => {
                let tree = self.store.course_tree(lesson.course_id).await?;
                tree.modules
                    .iter()
                    .flat_map(|m| &m.lessons)
                    .find(|l| l.lesson.id == lesson_id)
                    .map(|l| l.resources.len() as i32)
                    .unwrap_or(0)
            }
        };
        self.store
            .insert_resource(LessonResource {
                id: ResourceId::new(),
                lesson_id,
                title: dto.title,
                url: dto.url,
                resource_type: dto.resource_type,
                order_index,
                created_at: now,
                deleted_at: None,
            })
            .await
    }

    pub async fn course_tree(&self, id: CourseId) -> Result<CourseTree, CatalogError> {
        self.store.course_tree(id).await
    }

    pub async fn list_courses(
        &self,
        status: Option<CourseStatus>,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Course>, i64), AppError> {
        self.store.list_courses(status, pagination).await
    }

    /// Soft-deletes a course and everything under it.
    ///
    /// The visitor collects the live id sets from the tree first; the store
    /// then applies the whole batch in one write, so a reader never sees a
    /// half-deleted hierarchy.
    #[instrument(skip(self))]
    pub async fn delete_course(
        &self,
        actor_id: UserId,
        id: CourseId,
    ) -> Result<CourseTreeDeletion, CatalogError> {
        let tree = self.store.course_tree(id).await?;

        let mut deletion = CourseTreeDeletion {
            course_id: id,
            module_ids: Vec::new(),
            lesson_ids: Vec::new(),
            resource_ids: Vec::new(),
            deleted_at: Utc::now(),
        };
        for module in &tree.modules {
            deletion.module_ids.push(module.module.id);
            for lesson in &module.lessons {
                deletion.lesson_ids.push(lesson.lesson.id);
                for resource in &lesson.resources {
                    deletion.resource_ids.push(resource.id);
                }
            }
        }

        self.store.apply_course_deletion(&deletion).await?;
        self.store
            .record_audit(
                NewAuditEntry::new(actions::COURSE_DELETED, "course")
                    .actor(actor_id)
                    .entity(id.0),
            )
            .await?;
        info!(
            course_id = %id,
            modules = deletion.module_ids.len(),
            lessons = deletion.lesson_ids.len(),
            "course tree soft-deleted"
        );
        Ok(deletion)
    }

    async fn next_module_index(&self, course_id: CourseId) -> Result<i32, CatalogError> {
        let tree = self.store.course_tree(course_id).await?;
        Ok(tree
            .modules
            .iter()
            .map(|m| m.module.order_index + 1)
            .max()
            .unwrap_or(0))
    }

    async fn next_lesson_index(
        &self,
        course_id: CourseId,
        module_id: ModuleId,
    ) -> Result<i32, CatalogError> {
        let tree = self.store.course_tree(course_id).await?;
        Ok(tree
            .modules
            .iter()
            .find(|m| m.module.id == module_id)
            .map(|m| {
                m.lessons
                    .iter()
                    .map(|l| l.lesson.order_index + 1)
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0))
    }
}
