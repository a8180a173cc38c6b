//! Fire-and-forget audit recording.
//!
//! Audit rows are a best-effort side channel, not part of any operation's
//! atomicity boundary: a failed write is logged server-side and never
//! surfaced or allowed to fail the primary operation.

use async_trait::async_trait;
use portico_core::models::NewAuditRecord;
use portico_db::AuditLogRepository;

#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record an audit row. Must not fail the caller.
    async fn append(&self, record: NewAuditRecord);
}

/// Database-backed sink. The insert runs on a spawned task so the primary
/// operation returns without waiting on the audit store.
#[derive(Clone)]
pub struct DbAuditSink {
    repository: AuditLogRepository,
}

impl DbAuditSink {
    pub fn new(repository: AuditLogRepository) -> Self {
        DbAuditSink { repository }
    }
}

#[async_trait]
impl AuditSink for DbAuditSink {
    async fn append(&self, record: NewAuditRecord) {
        let repository = self.repository.clone();
        tokio::spawn(async move {
            if let Err(e) = repository.insert(&record).await {
                tracing::warn!(
                    error = %e,
                    action = %record.action,
                    table_name = %record.table_name,
                    user_id = %record.user_id,
                    "Audit write failed"
                );
            }
        });
    }
}
