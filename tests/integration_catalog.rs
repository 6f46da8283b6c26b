mod common;

use common::{memory_store, register_user, seed_course};
use edulife::modules::catalog::CatalogService;
use edulife_core::PaginationParams;
use edulife_models::courses::{
    CatalogError, CourseStatus, CreateCourseDto, CreateLessonDto, CreateModuleDto,
    CreateResourceDto,
};
use edulife_models::users::UserRole;

#[tokio::test]
async fn course_tree_tracks_counters_and_positions() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let catalog = CatalogService::new(store.clone());

    let course = catalog
        .create_course(
            teacher.id,
            CreateCourseDto {
                title: "Rust for Educators".into(),
                description: Some("Intro".into()),
                price: 9_900,
            },
        )
        .await
        .unwrap();
    assert_eq!(course.slug, "rust_for_educators");
    assert_eq!(course.status, CourseStatus::Draft);

    let m1 = catalog
        .add_module(course.id, CreateModuleDto { title: "Basics".into(), order_index: None })
        .await
        .unwrap();
    let m2 = catalog
        .add_module(course.id, CreateModuleDto { title: "Advanced".into(), order_index: None })
        .await
        .unwrap();
    assert_eq!(m1.order_index, 0);
    assert_eq!(m2.order_index, 1);

    for title in ["Ownership", "Borrowing"] {
        catalog
            .add_lesson(
                m1.id,
                CreateLessonDto {
                    title: title.into(),
                    order_index: None,
                    video_duration_seconds: Some(600),
                    test_passing_score: None,
                    test_time_limit_seconds: None,
                },
            )
            .await
            .unwrap();
    }

    let tree = catalog.course_tree(course.id).await.unwrap();
    assert_eq!(tree.course.modules_count, 2);
    assert_eq!(tree.course.lessons_count, 2);
    assert_eq!(tree.modules[0].lessons.len(), 2);
    assert_eq!(tree.modules[0].lessons[1].lesson.order_index, 1);
}

#[tokio::test]
async fn duplicate_order_index_is_rejected() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let catalog = CatalogService::new(store.clone());
    let course = catalog
        .create_course(
            teacher.id,
            CreateCourseDto { title: "Course".into(), description: None, price: 0 },
        )
        .await
        .unwrap();

    catalog
        .add_module(course.id, CreateModuleDto { title: "One".into(), order_index: Some(3) })
        .await
        .unwrap();
    let err = catalog
        .add_module(course.id, CreateModuleDto { title: "Two".into(), order_index: Some(3) })
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateOrderIndex { index: 3 }));
}

#[tokio::test]
async fn same_title_courses_get_distinct_slugs() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let catalog = CatalogService::new(store.clone());

    let dto = CreateCourseDto { title: "Intro to Piano".into(), description: None, price: 0 };
    let first = catalog.create_course(teacher.id, dto.clone()).await.unwrap();
    let second = catalog.create_course(teacher.id, dto).await.unwrap();
    assert_eq!(first.slug, "intro_to_piano");
    assert_ne!(first.slug, second.slug);
    assert!(second.slug.starts_with("intro_to_piano_"));
}

#[tokio::test]
async fn listing_filters_by_status() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let catalog = CatalogService::new(store.clone());
    seed_course(&store, teacher.id, 0, 1).await;
    catalog
        .create_course(
            teacher.id,
            CreateCourseDto { title: "Draft only".into(), description: None, price: 0 },
        )
        .await
        .unwrap();

    let (published, total) = catalog
        .list_courses(Some(CourseStatus::Published), &PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(published.len(), 1);

    let (_, all) = catalog
        .list_courses(None, &PaginationParams::default())
        .await
        .unwrap();
    assert_eq!(all, 2);
}

#[tokio::test]
async fn deleting_a_course_takes_the_whole_tree() {
    let store = memory_store();
    let teacher = register_user(&store, "teacher@example.com", UserRole::Teacher).await;
    let catalog = CatalogService::new(store.clone());
    let (course, _, lesson_ids) = seed_course(&store, teacher.id, 0, 3).await;
    catalog
        .add_resource(
            lesson_ids[0],
            CreateResourceDto {
                title: "Slides".into(),
                url: "https://cdn.example.com/slides.pdf".into(),
                resource_type: "pdf".into(),
                order_index: None,
            },
        )
        .await
        .unwrap();

    let deletion = catalog.delete_course(teacher.id, course.id).await.unwrap();
    assert_eq!(deletion.module_ids.len(), 1);
    assert_eq!(deletion.lesson_ids.len(), 3);
    assert_eq!(deletion.resource_ids.len(), 1);

    let err = catalog.course_tree(course.id).await.unwrap_err();
    assert!(matches!(err, CatalogError::CourseNotFound));
}
