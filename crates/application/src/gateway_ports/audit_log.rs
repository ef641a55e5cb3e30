use async_trait::async_trait;
use opsgate_core::AppResult;
use opsgate_domain::{AuditEntry, AuditHistoryQuery};

/// Port for the append-only deployment audit log.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Appends one entry after all previously appended entries.
    async fn append(&self, entry: &AuditEntry) -> AppResult<()>;

    /// Returns entries newest first, filtered by the query.
    ///
    /// Unreadable entries are skipped rather than failing the read.
    async fn read_history(&self, query: &AuditHistoryQuery) -> AppResult<Vec<AuditEntry>>;

    /// Removes every entry.
    async fn clear(&self) -> AppResult<()>;
}
