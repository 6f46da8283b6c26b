//! # EduLife Models
//!
//! Domain entities, DTOs, typed ids, and named error kinds for the EduLife
//! backend. One file per area, mirroring the persisted schema:
//!
//! - [`users`] / [`roles`] / [`sessions`]: identity & access
//! - [`courses`] / [`enrollments`] / [`assessments`]: content & progress
//! - [`payments`] / [`promos`] / [`earnings`]: commerce
//! - [`reviews`], [`media`], [`audit`]: reviews, video jobs, audit trail
//!
//! Every entity derives `sqlx::FromRow` so the Postgres adapters can map
//! rows directly; status/enum columns are Postgres enum types declared in
//! the migrations. Each area also defines its domain error enum with a
//! lossless conversion into [`edulife_core::AppError`].

pub mod assessments;
pub mod audit;
pub mod courses;
pub mod earnings;
pub mod enrollments;
pub mod ids;
pub mod media;
pub mod payments;
pub mod promos;
pub mod reviews;
pub mod roles;
pub mod sessions;
pub mod users;
pub mod value_types;
