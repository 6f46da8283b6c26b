//! Strongly-typed ID newtypes for domain entities.
//!
//! Newtype wrappers around `Uuid` for each entity type, preventing
//! accidental misuse of ids (e.g. passing a `CourseId` where a `UserId` is
//! expected).
//!
//! # Example
//!
//! ```ignore
//! use edulife_models::ids::{CourseId, UserId};
//!
//! fn enroll(user: UserId, course: CourseId) { /* ... */ }
//!
//! let user = UserId::new();
//! let course = CourseId::new();
//! enroll(user, course);      // OK
//! // enroll(course, user);   // Compile error
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Defines a strongly-typed ID newtype with database and serde support.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize, sqlx::Type,
        )]
        #[sqlx(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID.
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an ID from an existing UUID.
            #[inline]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Create an ID from a u128 value (useful for constants).
            #[inline]
            pub const fn from_u128(v: u128) -> Self {
                Self(Uuid::from_u128(v))
            }

            /// Get the inner UUID value.
            #[inline]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id!(
    /// Identifies a [`crate::users::User`].
    UserId
);
define_id!(
    /// Identifies a [`crate::roles::Role`].
    RoleId
);
define_id!(
    /// Identifies a [`crate::roles::Permission`].
    PermissionId
);
define_id!(
    /// Identifies a [`crate::sessions::Session`].
    SessionId
);
define_id!(
    /// Identifies a [`crate::sessions::RefreshTokenRecord`].
    RefreshTokenId
);
define_id!(
    /// Identifies a [`crate::courses::Course`].
    CourseId
);
define_id!(
    /// Identifies a [`crate::courses::CourseModule`].
    ModuleId
);
define_id!(
    /// Identifies a [`crate::courses::Lesson`].
    LessonId
);
define_id!(
    /// Identifies a [`crate::courses::LessonResource`].
    ResourceId
);
define_id!(
    /// Identifies a [`crate::enrollments::Enrollment`].
    EnrollmentId
);
define_id!(
    /// Identifies a [`crate::enrollments::LessonProgress`] row.
    LessonProgressId
);
define_id!(
    /// Identifies a [`crate::assessments::Question`].
    QuestionId
);
define_id!(
    /// Identifies a [`crate::assessments::QuestionOption`].
    QuestionOptionId
);
define_id!(
    /// Identifies a [`crate::assessments::TestAttempt`].
    AttemptId
);
define_id!(
    /// Identifies a [`crate::assessments::TestAnswer`].
    AnswerId
);
define_id!(
    /// Identifies a [`crate::payments::Payment`].
    PaymentId
);
define_id!(
    /// Identifies a [`crate::payments::Subscription`].
    SubscriptionId
);
define_id!(
    /// Identifies a [`crate::promos::PromoCode`].
    PromoCodeId
);
define_id!(
    /// Identifies a [`crate::promos::PromoCodeUsage`] row.
    PromoUsageId
);
define_id!(
    /// Identifies a [`crate::earnings::TeacherEarning`].
    EarningId
);
define_id!(
    /// Identifies a [`crate::earnings::TeacherPayout`].
    PayoutId
);
define_id!(
    /// Identifies a [`crate::reviews::Review`].
    ReviewId
);
define_id!(
    /// Identifies a [`crate::media::VideoProcessingJob`].
    VideoJobId
);
define_id!(
    /// Identifies an [`crate::audit::AuditEntry`].
    AuditId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        fn takes_user(_: UserId) {}
        takes_user(UserId::new());
        // takes_user(CourseId::new()); // must not compile
    }

    #[test]
    fn display_matches_uuid() {
        let uuid = Uuid::new_v4();
        let id = CourseId::from_uuid(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }
}
