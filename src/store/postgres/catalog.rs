use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::{AppError, PaginationParams};
use edulife_models::courses::{
    CatalogError, Course, CourseModule, CourseStatus, CourseTree, CourseTreeDeletion, Lesson,
    LessonNode, LessonResource, ModuleNode,
};
use edulife_models::ids::{CourseId, LessonId, ModuleId};

use super::{is_unique_violation, storage_error, PostgresStore};
use crate::store::ports::CatalogStore;

fn catalog_storage(e: sqlx::Error) -> CatalogError {
    CatalogError::Storage(storage_error(e))
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn insert_course(&self, course: Course) -> Result<Course, CatalogError> {
        sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (id, teacher_id, title, slug, description, price, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(course.id)
        .bind(course.teacher_id)
        .bind(course.title)
        .bind(course.slug)
        .bind(course.description)
        .bind(course.price)
        .bind(course.status)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CatalogError::DuplicateSlug
            } else {
                catalog_storage(e)
            }
        })
    }

    async fn find_course(&self, id: CourseId) -> Result<Option<Course>, AppError> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(storage_error)
    }

    async fn find_course_by_slug(&self, slug: &str) -> Result<Option<Course>, AppError> {
        sqlx::query_as::<_, Course>(
            "SELECT * FROM courses WHERE slug = $1 AND deleted_at IS NULL",
        )
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn update_course_status(
        &self,
        id: CourseId,
        status: CourseStatus,
        now: DateTime<Utc>,
    ) -> Result<Course, CatalogError> {
        sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses SET status = $2, updated_at = $3
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(now)
        .fetch_optional(self.pool())
        .await
        .map_err(catalog_storage)?
        .ok_or(CatalogError::CourseNotFound)
    }

    async fn list_courses(
        &self,
        status: Option<CourseStatus>,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Course>, i64), AppError> {
        let courses = sqlx::query_as::<_, Course>(
            r#"
            SELECT * FROM courses
            WHERE deleted_at IS NULL AND ($1::course_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.pool())
        .await
        .map_err(storage_error)?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM courses
            WHERE deleted_at IS NULL AND ($1::course_status IS NULL OR status = $1)
            "#,
        )
        .bind(status)
        .fetch_one(self.pool())
        .await
        .map_err(storage_error)?;

        Ok((courses, total))
    }

    async fn insert_module(&self, module: CourseModule) -> Result<CourseModule, CatalogError> {
        let mut tx = self.pool().begin().await.map_err(catalog_storage)?;

        let inserted = sqlx::query_as::<_, CourseModule>(
            r#"
            INSERT INTO course_modules (id, course_id, title, order_index)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(module.id)
        .bind(module.course_id)
        .bind(module.title)
        .bind(module.order_index)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CatalogError::DuplicateOrderIndex {
                    index: module.order_index,
                }
            } else {
                catalog_storage(e)
            }
        })?;

        let updated = sqlx::query(
            r#"
            UPDATE courses SET modules_count = modules_count + 1, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(inserted.course_id)
        .execute(&mut *tx)
        .await
        .map_err(catalog_storage)?;
        if updated.rows_affected() == 0 {
            return Err(CatalogError::CourseNotFound);
        }

        tx.commit().await.map_err(catalog_storage)?;
        Ok(inserted)
    }

    async fn find_module(&self, id: ModuleId) -> Result<Option<CourseModule>, AppError> {
        sqlx::query_as::<_, CourseModule>(
            "SELECT * FROM course_modules WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn insert_lesson(&self, lesson: Lesson) -> Result<Lesson, CatalogError> {
        let mut tx = self.pool().begin().await.map_err(catalog_storage)?;

        let inserted = sqlx::query_as::<_, Lesson>(
            r#"
            INSERT INTO lessons
                (id, module_id, course_id, title, order_index, video_duration_seconds,
                 test_passing_score, test_time_limit_seconds)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(lesson.id)
        .bind(lesson.module_id)
        .bind(lesson.course_id)
        .bind(lesson.title)
        .bind(lesson.order_index)
        .bind(lesson.video_duration_seconds)
        .bind(lesson.test_passing_score)
        .bind(lesson.test_time_limit_seconds)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CatalogError::DuplicateOrderIndex {
                    index: lesson.order_index,
                }
            } else {
                catalog_storage(e)
            }
        })?;

        let updated = sqlx::query(
            r#"
            UPDATE course_modules SET lessons_count = lessons_count + 1, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(inserted.module_id)
        .execute(&mut *tx)
        .await
        .map_err(catalog_storage)?;
        if updated.rows_affected() == 0 {
            return Err(CatalogError::ModuleNotFound);
        }

        sqlx::query(
            r#"
            UPDATE courses SET lessons_count = lessons_count + 1, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(inserted.course_id)
        .execute(&mut *tx)
        .await
        .map_err(catalog_storage)?;

        tx.commit().await.map_err(catalog_storage)?;
        Ok(inserted)
    }

    async fn find_lesson(&self, id: LessonId) -> Result<Option<Lesson>, AppError> {
        sqlx::query_as::<_, Lesson>(
            "SELECT * FROM lessons WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn insert_resource(
        &self,
        resource: LessonResource,
    ) -> Result<LessonResource, CatalogError> {
        sqlx::query_as::<_, LessonResource>(
            r#"
            INSERT INTO lesson_resources (id, lesson_id, title, url, resource_type, order_index)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(resource.id)
        .bind(resource.lesson_id)
        .bind(resource.title)
        .bind(resource.url)
        .bind(resource.resource_type)
        .bind(resource.order_index)
        .fetch_one(self.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CatalogError::DuplicateOrderIndex {
                    index: resource.order_index,
                }
            } else {
                catalog_storage(e)
            }
        })
    }

    async fn course_tree(&self, id: CourseId) -> Result<CourseTree, CatalogError> {
        let course = sqlx::query_as::<_, Course>(
            "SELECT * FROM courses WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(catalog_storage)?
        .ok_or(CatalogError::CourseNotFound)?;

        let modules = sqlx::query_as::<_, CourseModule>(
            r#"
            SELECT * FROM course_modules
            WHERE course_id = $1 AND deleted_at IS NULL
            ORDER BY order_index
            "#,
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .map_err(catalog_storage)?;

        let lessons = sqlx::query_as::<_, Lesson>(
            r#"
            SELECT * FROM lessons
            WHERE course_id = $1 AND deleted_at IS NULL
            ORDER BY order_index
            "#,
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .map_err(catalog_storage)?;

        let resources = sqlx::query_as::<_, LessonResource>(
            r#"
            SELECT r.* FROM lesson_resources r
            JOIN lessons l ON l.id = r.lesson_id
            WHERE l.course_id = $1 AND r.deleted_at IS NULL
            ORDER BY r.order_index
            "#,
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .map_err(catalog_storage)?;

        let module_nodes = modules
            .into_iter()
            .map(|module| {
                let lesson_nodes = lessons
                    .iter()
                    .filter(|l| l.module_id == module.id)
                    .map(|lesson| LessonNode {
                        lesson: lesson.clone(),
                        resources: resources
                            .iter()
                            .filter(|r| r.lesson_id == lesson.id)
                            .cloned()
                            .collect(),
                    })
                    .collect();
                ModuleNode {
                    module,
                    lessons: lesson_nodes,
                }
            })
            .collect();

        Ok(CourseTree {
            course,
            modules: module_nodes,
        })
    }

    async fn apply_course_deletion(
        &self,
        deletion: &CourseTreeDeletion,
    ) -> Result<(), CatalogError> {
        let mut tx = self.pool().begin().await.map_err(catalog_storage)?;

        let updated = sqlx::query(
            r#"
            UPDATE courses
            SET deleted_at = $2, updated_at = $2, modules_count = 0, lessons_count = 0
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(deletion.course_id)
        .bind(deletion.deleted_at)
        .execute(&mut *tx)
        .await
        .map_err(catalog_storage)?;
        if updated.rows_affected() == 0 {
            return Err(CatalogError::CourseNotFound);
        }

        let module_ids: Vec<uuid::Uuid> =
            deletion.module_ids.iter().map(|id| id.0).collect();
        sqlx::query(
            "UPDATE course_modules SET deleted_at = $2, lessons_count = 0 WHERE id = ANY($1)",
        )
        .bind(&module_ids)
        .bind(deletion.deleted_at)
        .execute(&mut *tx)
        .await
        .map_err(catalog_storage)?;

        let lesson_ids: Vec<uuid::Uuid> =
            deletion.lesson_ids.iter().map(|id| id.0).collect();
        sqlx::query("UPDATE lessons SET deleted_at = $2 WHERE id = ANY($1)")
            .bind(&lesson_ids)
            .bind(deletion.deleted_at)
            .execute(&mut *tx)
            .await
            .map_err(catalog_storage)?;

        let resource_ids: Vec<uuid::Uuid> =
            deletion.resource_ids.iter().map(|id| id.0).collect();
        sqlx::query("UPDATE lesson_resources SET deleted_at = $2 WHERE id = ANY($1)")
            .bind(&resource_ids)
            .bind(deletion.deleted_at)
            .execute(&mut *tx)
            .await
            .map_err(catalog_storage)?;

        tx.commit().await.map_err(catalog_storage)?;
        Ok(())
    }
}
