//! # EduLife Core
//!
//! Core types, errors, and utilities for the EduLife backend.
//!
//! This crate provides foundational types used throughout the EduLife
//! application:
//!
//! - [`errors`]: Application error type with HTTP status mapping
//! - [`numeric`]: Rounding helpers for progress and score percentages
//! - [`pagination`]: Pagination utilities for list responses
//! - [`password`]: Secure password hashing and verification
//! - [`permissions`]: Centralized permission slug constants
//! - [`response`]: The `{success, data, message}` response envelope
//!
//! # Example
//!
//! ```ignore
//! use edulife_core::AppError;
//! use edulife_core::password::{hash_password, verify_password};
//!
//! let hash = hash_password("secure_password")?;
//! assert!(verify_password("secure_password", &hash)?);
//!
//! let error = AppError::not_found("Course not found");
//! assert_eq!(error.status().as_u16(), 404);
//! ```

pub mod errors;
pub mod numeric;
pub mod pagination;
pub mod password;
pub mod permissions;
pub mod response;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use numeric::{progress_percent, round2};
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
pub use response::ApiResponse;
