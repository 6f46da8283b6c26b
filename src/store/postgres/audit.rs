use async_trait::async_trait;

use edulife_core::{AppError, PaginationParams};
use edulife_models::audit::{AuditEntry, NewAuditEntry};

use super::{storage_error, PostgresStore};
use crate::store::ports::AuditStore;

#[async_trait]
impl AuditStore for PostgresStore {
    async fn record_audit(&self, entry: NewAuditEntry) -> Result<AuditEntry, AppError> {
        sqlx::query_as::<_, AuditEntry>(
            r#"
            INSERT INTO audit_log (actor_id, action, entity_type, entity_id, detail)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(entry.actor_id)
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.detail)
        .fetch_one(self.pool())
        .await
        .map_err(storage_error)
    }

    async fn list_audit(
        &self,
        action: Option<&str>,
        entity_type: Option<&str>,
        pagination: &PaginationParams,
    ) -> Result<(Vec<AuditEntry>, i64), AppError> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT * FROM audit_log
            WHERE ($1::varchar IS NULL OR action = $1)
              AND ($2::varchar IS NULL OR entity_type = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(action)
        .bind(entity_type)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(self.pool())
        .await
        .map_err(storage_error)?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM audit_log
            WHERE ($1::varchar IS NULL OR action = $1)
              AND ($2::varchar IS NULL OR entity_type = $2)
            "#,
        )
        .bind(action)
        .bind(entity_type)
        .fetch_one(self.pool())
        .await
        .map_err(storage_error)?;

        Ok((entries, total))
    }
}
