use async_trait::async_trait;
use chrono::Utc;

use edulife_core::{AppError, PaginationParams};
use edulife_models::audit::{AuditEntry, NewAuditEntry};
use edulife_models::ids::AuditId;

use super::MemoryStore;
use crate::store::ports::AuditStore;

#[async_trait]
impl AuditStore for MemoryStore {
    async fn record_audit(&self, entry: NewAuditEntry) -> Result<AuditEntry, AppError> {
        let entry = AuditEntry {
            id: AuditId::new(),
            actor_id: entry.actor_id,
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            detail: entry.detail,
            created_at: Utc::now(),
        };
        self.lock().audit.push(entry.clone());
        Ok(entry)
    }

    async fn list_audit(
        &self,
        action: Option<&str>,
        entity_type: Option<&str>,
        pagination: &PaginationParams,
    ) -> Result<(Vec<AuditEntry>, i64), AppError> {
        let inner = self.lock();
        let mut entries: Vec<AuditEntry> = inner
            .audit
            .iter()
            .filter(|e| action.is_none_or(|a| e.action == a))
            .filter(|e| entity_type.is_none_or(|t| e.entity_type == t))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = entries.len() as i64;
        let page: Vec<AuditEntry> = entries
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect();
        Ok((page, total))
    }
}
