//! Postgres adapter.
//!
//! Runtime-checked sqlx queries mapped through the models' `FromRow`
//! derives. Multi-row writes run inside a transaction; unique-violation
//! errors are translated into the matching domain error.

mod assessments;
mod audit;
mod catalog;
mod commerce;
mod identity;
mod media;
mod payouts;
mod progress;
mod reviews;

use sqlx::postgres::PgPool;

use edulife_core::AppError;

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Whether a sqlx error is a Postgres unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

pub(crate) fn storage_error(err: sqlx::Error) -> AppError {
    AppError::internal_error(format!("Database error: {}", err))
}
