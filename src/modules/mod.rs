//! Domain services, one module per area.
//!
//! Services hold an `Arc<dyn Store>` plus whatever config their policies
//! need; all multi-row writes go through a single atomic store method.

pub mod access;
pub mod assessments;
pub mod auth;
pub mod catalog;
pub mod commerce;
pub mod media;
pub mod payouts;
pub mod progress;
pub mod reviews;
