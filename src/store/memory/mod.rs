//! In-memory adapter backed by a single mutex.
//!
//! Every port method takes the lock once, so multi-row writes are atomic
//! exactly like the Postgres adapter's transactions. Used by the
//! integration tests; `new()` seeds the same system roles and permissions
//! as the migrations.

mod assessments;
mod audit;
mod catalog;
mod commerce;
mod identity;
mod media;
mod payouts;
mod progress;
mod reviews;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use edulife_models::assessments::{Question, QuestionOption, TestAnswer, TestAttempt};
use edulife_models::audit::AuditEntry;
use edulife_models::courses::{Course, CourseModule, Lesson, LessonResource};
use edulife_models::enrollments::{Enrollment, LessonProgress};
use edulife_models::earnings::{TeacherEarning, TeacherPayout};
use edulife_models::ids::*;
use edulife_models::media::VideoProcessingJob;
use edulife_models::payments::{Payment, Subscription};
use edulife_models::promos::{PromoCode, PromoCodeUsage};
use edulife_models::reviews::Review;
use edulife_models::roles::{Permission, Role, RolePermission};
use edulife_models::sessions::{BlacklistEntry, RefreshTokenRecord, Session};
use edulife_models::users::User;

#[derive(Default)]
pub(crate) struct Inner {
    pub users: HashMap<UserId, User>,
    pub roles: HashMap<RoleId, Role>,
    pub permissions: HashMap<PermissionId, Permission>,
    pub role_permissions: Vec<RolePermission>,
    pub sessions: HashMap<SessionId, Session>,
    pub refresh_tokens: HashMap<RefreshTokenId, RefreshTokenRecord>,
    pub blacklist: HashMap<String, BlacklistEntry>,
    pub courses: HashMap<CourseId, Course>,
    pub modules: HashMap<ModuleId, CourseModule>,
    pub lessons: HashMap<LessonId, Lesson>,
    pub resources: HashMap<ResourceId, LessonResource>,
    pub enrollments: HashMap<EnrollmentId, Enrollment>,
    pub lesson_progress: HashMap<LessonProgressId, LessonProgress>,
    pub questions: HashMap<QuestionId, Question>,
    pub question_options: HashMap<QuestionOptionId, QuestionOption>,
    pub attempts: HashMap<AttemptId, TestAttempt>,
    pub answers: HashMap<AnswerId, TestAnswer>,
    pub payments: HashMap<PaymentId, Payment>,
    pub subscriptions: HashMap<SubscriptionId, Subscription>,
    pub promo_codes: HashMap<PromoCodeId, PromoCode>,
    pub promo_usages: HashMap<PromoUsageId, PromoCodeUsage>,
    pub earnings: HashMap<EarningId, TeacherEarning>,
    pub payouts: HashMap<PayoutId, TeacherPayout>,
    pub reviews: HashMap<ReviewId, Review>,
    pub video_jobs: HashMap<VideoJobId, VideoProcessingJob>,
    pub audit: Vec<AuditEntry>,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let store = Self {
            inner: Mutex::new(Inner::default()),
        };
        store.seed_access_control();
        store
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mirrors the migration seed: four system roles and the permission
    /// catalog, with grants per role.
    fn seed_access_control(&self) {
        let now = Utc::now();
        let mut inner = self.lock();

        let mut permission_ids: HashMap<&str, PermissionId> = HashMap::new();
        for slug in edulife_core::permissions::ALL {
            let id = PermissionId::new();
            permission_ids.insert(slug, id);
            inner.permissions.insert(
                id,
                Permission {
                    id,
                    slug: slug.to_string(),
                    description: None,
                    created_at: now,
                },
            );
        }

        use edulife_core::permissions as p;
        let grants: [(&str, &str, Vec<&str>); 4] = [
            (
                "Student",
                "student",
                vec![
                    p::COURSES_READ,
                    p::ENROLLMENTS_CREATE,
                    p::ENROLLMENTS_READ,
                    p::TESTS_TAKE,
                    p::REVIEWS_CREATE,
                ],
            ),
            (
                "Teacher",
                "teacher",
                vec![
                    p::COURSES_CREATE,
                    p::COURSES_READ,
                    p::COURSES_UPDATE,
                    p::COURSES_PUBLISH,
                    p::LESSONS_MANAGE,
                    p::TESTS_MANAGE,
                    p::ENROLLMENTS_READ,
                ],
            ),
            (
                "Admin",
                "admin",
                edulife_core::permissions::ALL
                    .iter()
                    .copied()
                    .filter(|slug| *slug != p::TESTS_TAKE)
                    .collect(),
            ),
            ("Super Admin", "super_admin", vec![]),
        ];

        for (name, slug, permissions) in grants {
            let role_id = RoleId::new();
            inner.roles.insert(
                role_id,
                Role {
                    id: role_id,
                    name: name.to_string(),
                    slug: slug.to_string(),
                    description: None,
                    is_system: true,
                    created_at: now,
                    updated_at: now,
                },
            );
            for slug in permissions {
                if let Some(&permission_id) = permission_ids.get(slug) {
                    inner.role_permissions.push(RolePermission {
                        role_id,
                        permission_id,
                        created_at: now,
                    });
                }
            }
        }
    }
}
