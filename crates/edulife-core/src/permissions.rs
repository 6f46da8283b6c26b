//! Permission slug constants for the EduLife API.
//!
//! Centralized permission strings used across the codebase. Using these
//! constants instead of string literals keeps role seeding, authorization
//! checks, and tests in agreement.
//!
//! # Example
//!
//! ```ignore
//! use edulife_core::permissions;
//!
//! if access.authorize(&user, permissions::COURSES_PUBLISH).await? {
//!     // Publish course
//! }
//! ```

// =============================================================================
// Users
// =============================================================================

/// Permission to create users
pub const USERS_CREATE: &str = "users:create";
/// Permission to read users
pub const USERS_READ: &str = "users:read";
/// Permission to update users
pub const USERS_UPDATE: &str = "users:update";
/// Permission to delete users
pub const USERS_DELETE: &str = "users:delete";

// =============================================================================
// Roles
// =============================================================================

/// Permission to manage roles and their permission sets
pub const ROLES_MANAGE: &str = "roles:manage";
/// Permission to read roles
pub const ROLES_READ: &str = "roles:read";

// =============================================================================
// Courses & content
// =============================================================================

/// Permission to create courses
pub const COURSES_CREATE: &str = "courses:create";
/// Permission to read courses
pub const COURSES_READ: &str = "courses:read";
/// Permission to update courses
pub const COURSES_UPDATE: &str = "courses:update";
/// Permission to delete courses
pub const COURSES_DELETE: &str = "courses:delete";
/// Permission to publish courses
pub const COURSES_PUBLISH: &str = "courses:publish";
/// Permission to manage lessons and resources
pub const LESSONS_MANAGE: &str = "lessons:manage";

// =============================================================================
// Enrollment & progress
// =============================================================================

/// Permission to enroll in courses
pub const ENROLLMENTS_CREATE: &str = "enrollments:create";
/// Permission to read enrollments
pub const ENROLLMENTS_READ: &str = "enrollments:read";

// =============================================================================
// Assessments
// =============================================================================

/// Permission to manage questions and tests
pub const TESTS_MANAGE: &str = "tests:manage";
/// Permission to take tests
pub const TESTS_TAKE: &str = "tests:take";

// =============================================================================
// Commerce
// =============================================================================

/// Permission to manage promo codes
pub const PROMOS_MANAGE: &str = "promos:manage";
/// Permission to read payments
pub const PAYMENTS_READ: &str = "payments:read";
/// Permission to refund payments
pub const PAYMENTS_REFUND: &str = "payments:refund";
/// Permission to create teacher payouts
pub const PAYOUTS_CREATE: &str = "payouts:create";
/// Permission to complete teacher payouts
pub const PAYOUTS_COMPLETE: &str = "payouts:complete";

// =============================================================================
// Reviews
// =============================================================================

/// Permission to create reviews
pub const REVIEWS_CREATE: &str = "reviews:create";
/// Permission to moderate (delete) reviews
pub const REVIEWS_MODERATE: &str = "reviews:moderate";

/// Every permission slug known to the system, in seeding order.
pub const ALL: &[&str] = &[
    USERS_CREATE,
    USERS_READ,
    USERS_UPDATE,
    USERS_DELETE,
    ROLES_MANAGE,
    ROLES_READ,
    COURSES_CREATE,
    COURSES_READ,
    COURSES_UPDATE,
    COURSES_DELETE,
    COURSES_PUBLISH,
    LESSONS_MANAGE,
    ENROLLMENTS_CREATE,
    ENROLLMENTS_READ,
    TESTS_MANAGE,
    TESTS_TAKE,
    PROMOS_MANAGE,
    PAYMENTS_READ,
    PAYMENTS_REFUND,
    PAYOUTS_CREATE,
    PAYOUTS_COMPLETE,
    REVIEWS_CREATE,
    REVIEWS_MODERATE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for slug in ALL {
            assert!(seen.insert(slug), "duplicate permission slug: {}", slug);
        }
    }

    #[test]
    fn slugs_are_well_formed() {
        for slug in ALL {
            let parts: Vec<&str> = slug.split(':').collect();
            assert_eq!(parts.len(), 2, "bad slug: {}", slug);
            assert!(!parts[0].is_empty() && !parts[1].is_empty());
        }
    }
}
