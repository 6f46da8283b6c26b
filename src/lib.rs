//! EduLife backend: courses, enrollments, assessments, payments, and
//! teacher earnings for an online learning platform.
//!
//! The crate is split along two axes: domain services under [`modules`],
//! and persistence behind the [`store`] traits with Postgres and
//! in-memory implementations.

pub mod cli;
pub mod db;
pub mod modules;
pub mod state;
pub mod store;
