use async_trait::async_trait;

use edulife_core::{AppError, PaginationParams};
use edulife_models::audit::{AuditEntry, NewAuditEntry};

/// The append-only audit trail.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn record_audit(&self, entry: NewAuditEntry) -> Result<AuditEntry, AppError>;

    /// Newest first, optionally filtered by action and entity type.
    async fn list_audit(
        &self,
        action: Option<&str>,
        entity_type: Option<&str>,
        pagination: &PaginationParams,
    ) -> Result<(Vec<AuditEntry>, i64), AppError>;
}
