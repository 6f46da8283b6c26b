use async_trait::async_trait;
use chrono::{DateTime, Utc};

use edulife_core::{AppError, PaginationParams};
use edulife_models::courses::{
    CatalogError, Course, CourseModule, CourseStatus, CourseTree, CourseTreeDeletion, Lesson,
    LessonNode, LessonResource, ModuleNode,
};
use edulife_models::ids::{CourseId, LessonId, ModuleId};

use super::MemoryStore;
use crate::store::ports::CatalogStore;

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn insert_course(&self, course: Course) -> Result<Course, CatalogError> {
        let mut inner = self.lock();
        if inner
            .courses
            .values()
            .any(|c| c.deleted_at.is_none() && c.slug == course.slug)
        {
            return Err(CatalogError::DuplicateSlug);
        }
        inner.courses.insert(course.id, course.clone());
        Ok(course)
    }

    async fn find_course(&self, id: CourseId) -> Result<Option<Course>, AppError> {
        Ok(self
            .lock()
            .courses
            .get(&id)
            .filter(|c| c.deleted_at.is_none())
            .cloned())
    }

    async fn find_course_by_slug(&self, slug: &str) -> Result<Option<Course>, AppError> {
        Ok(self
            .lock()
            .courses
            .values()
            .find(|c| c.deleted_at.is_none() && c.slug == slug)
            .cloned())
    }

    async fn update_course_status(
        &self,
        id: CourseId,
        status: CourseStatus,
        now: DateTime<Utc>,
    ) -> Result<Course, CatalogError> {
        let mut inner = self.lock();
        let course = inner
            .courses
            .get_mut(&id)
            .filter(|c| c.deleted_at.is_none())
            .ok_or(CatalogError::CourseNotFound)?;
        course.status = status;
        course.updated_at = now;
        Ok(course.clone())
    }

    async fn list_courses(
        &self,
        status: Option<CourseStatus>,
        pagination: &PaginationParams,
    ) -> Result<(Vec<Course>, i64), AppError> {
        let inner = self.lock();
        let mut courses: Vec<Course> = inner
            .courses
            .values()
            .filter(|c| c.deleted_at.is_none())
            .filter(|c| status.is_none_or(|s| c.status == s))
            .cloned()
            .collect();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = courses.len() as i64;
        let page: Vec<Course> = courses
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect();
        Ok((page, total))
    }

    async fn insert_module(&self, module: CourseModule) -> Result<CourseModule, CatalogError> {
        let mut inner = self.lock();
        if !inner
            .courses
            .get(&module.course_id)
            .is_some_and(|c| c.deleted_at.is_none())
        {
            return Err(CatalogError::CourseNotFound);
        }
        if inner.modules.values().any(|m| {
            m.deleted_at.is_none()
                && m.course_id == module.course_id
                && m.order_index == module.order_index
        }) {
            return Err(CatalogError::DuplicateOrderIndex {
                index: module.order_index,
            });
        }
        inner.modules.insert(module.id, module.clone());
        if let Some(course) = inner.courses.get_mut(&module.course_id) {
            course.modules_count += 1;
            course.updated_at = module.created_at;
        }
        Ok(module)
    }

    async fn find_module(&self, id: ModuleId) -> Result<Option<CourseModule>, AppError> {
        Ok(self
            .lock()
            .modules
            .get(&id)
            .filter(|m| m.deleted_at.is_none())
            .cloned())
    }

    async fn insert_lesson(&self, lesson: Lesson) -> Result<Lesson, CatalogError> {
        let mut inner = self.lock();
        if !inner
            .modules
            .get(&lesson.module_id)
            .is_some_and(|m| m.deleted_at.is_none())
        {
            return Err(CatalogError::ModuleNotFound);
        }
        if inner.lessons.values().any(|l| {
            l.deleted_at.is_none()
                && l.module_id == lesson.module_id
                && l.order_index == lesson.order_index
        }) {
            return Err(CatalogError::DuplicateOrderIndex {
                index: lesson.order_index,
            });
        }
        inner.lessons.insert(lesson.id, lesson.clone());
        if let Some(module) = inner.modules.get_mut(&lesson.module_id) {
            module.lessons_count += 1;
            module.updated_at = lesson.created_at;
        }
        if let Some(course) = inner.courses.get_mut(&lesson.course_id) {
            course.lessons_count += 1;
            course.updated_at = lesson.created_at;
        }
        Ok(lesson)
    }

    async fn find_lesson(&self, id: LessonId) -> Result<Option<Lesson>, AppError> {
        Ok(self
            .lock()
            .lessons
            .get(&id)
            .filter(|l| l.deleted_at.is_none())
            .cloned())
    }

    async fn insert_resource(
        &self,
        resource: LessonResource,
    ) -> Result<LessonResource, CatalogError> {
        let mut inner = self.lock();
        if !inner
            .lessons
            .get(&resource.lesson_id)
            .is_some_and(|l| l.deleted_at.is_none())
        {
            return Err(CatalogError::LessonNotFound);
        }
        if inner.resources.values().any(|r| {
            r.deleted_at.is_none()
                && r.lesson_id == resource.lesson_id
                && r.order_index == resource.order_index
        }) {
            return Err(CatalogError::DuplicateOrderIndex {
                index: resource.order_index,
            });
        }
        inner.resources.insert(resource.id, resource.clone());
        Ok(resource)
    }

    async fn course_tree(&self, id: CourseId) -> Result<CourseTree, CatalogError> {
        let inner = self.lock();
        let course = inner
            .courses
            .get(&id)
            .filter(|c| c.deleted_at.is_none())
            .cloned()
            .ok_or(CatalogError::CourseNotFound)?;

        let mut modules: Vec<CourseModule> = inner
            .modules
            .values()
            .filter(|m| m.deleted_at.is_none() && m.course_id == id)
            .cloned()
            .collect();
        modules.sort_by_key(|m| m.order_index);

        let mut module_nodes = Vec::with_capacity(modules.len());
        for module in modules {
            let mut lessons: Vec<Lesson> = inner
                .lessons
                .values()
                .filter(|l| l.deleted_at.is_none() && l.module_id == module.id)
                .cloned()
                .collect();
            lessons.sort_by_key(|l| l.order_index);

            let mut lesson_nodes = Vec::with_capacity(lessons.len());
            for lesson in lessons {
                let mut resources: Vec<LessonResource> = inner
                    .resources
                    .values()
                    .filter(|r| r.deleted_at.is_none() && r.lesson_id == lesson.id)
                    .cloned()
                    .collect();
                resources.sort_by_key(|r| r.order_index);
                lesson_nodes.push(LessonNode { lesson, resources });
            }
            module_nodes.push(ModuleNode {
                module,
                lessons: lesson_nodes,
            });
        }

        Ok(CourseTree {
            course,
            modules: module_nodes,
        })
    }

    async fn apply_course_deletion(
        &self,
        deletion: &CourseTreeDeletion,
    ) -> Result<(), CatalogError> {
        let mut inner = self.lock();
        let course = inner
            .courses
            .get_mut(&deletion.course_id)
            .filter(|c| c.deleted_at.is_none())
            .ok_or(CatalogError::CourseNotFound)?;
        course.deleted_at = Some(deletion.deleted_at);
        course.updated_at = deletion.deleted_at;
        course.modules_count = 0;
        course.lessons_count = 0;

        for id in &deletion.module_ids {
            if let Some(module) = inner.modules.get_mut(id) {
                module.deleted_at = Some(deletion.deleted_at);
                module.lessons_count = 0;
            }
        }
        for id in &deletion.lesson_ids {
            if let Some(lesson) = inner.lessons.get_mut(id) {
                lesson.deleted_at = Some(deletion.deleted_at);
            }
        }
        for id in &deletion.resource_ids {
            if let Some(resource) = inner.resources.get_mut(id) {
                resource.deleted_at = Some(deletion.deleted_at);
            }
        }
        Ok(())
    }
}
