use std::sync::Arc;

use chrono::Utc;
use opsgate_core::AppResult;
use opsgate_domain::{
    AuditEntry, AuditHistoryQuery, AuditMode, OperationDescriptor, RouteKey, truncate_output,
};

use crate::gateway_ports::AuditLogRepository;

/// Fields describing one dispatch decision to record.
#[derive(Debug, Clone)]
pub struct ExecutionRecord<'a> {
    /// Operation the decision concerns.
    pub operation: &'a OperationDescriptor,
    /// Recorded outcome class.
    pub mode: AuditMode,
    /// Process exit code, when a command ran.
    pub returncode: Option<i32>,
    /// Wall time, when a command ran.
    pub duration_ms: Option<u64>,
    /// Raw output before truncation.
    pub output: Option<&'a str>,
    /// Operator identity supplied by the caller.
    pub operator: Option<&'a str>,
}

impl<'a> ExecutionRecord<'a> {
    /// Starts a record with no execution result.
    #[must_use]
    pub fn new(operation: &'a OperationDescriptor, mode: AuditMode) -> Self {
        Self {
            operation,
            mode,
            returncode: None,
            duration_ms: None,
            output: None,
            operator: None,
        }
    }
}

/// Application service for the deployment audit trail.
#[derive(Clone)]
pub struct AuditLogService {
    repository: Arc<dyn AuditLogRepository>,
}

impl AuditLogService {
    /// Creates an audit log service.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditLogRepository>) -> Self {
        Self { repository }
    }

    /// Returns filtered entries, newest first.
    pub async fn read_history(&self, query: &AuditHistoryQuery) -> AppResult<Vec<AuditEntry>> {
        self.repository.read_history(query).await
    }

    /// Records one dispatch decision stamped now, truncating its output.
    pub async fn record_execution(&self, record: ExecutionRecord<'_>) -> AppResult<AuditEntry> {
        let operation = record.operation;
        let entry = AuditEntry {
            timestamp: Utc::now(),
            resource: operation.resource().to_owned(),
            provider: operation.provider().to_owned(),
            action: operation.action().to_owned(),
            command: operation.command().to_owned(),
            mode: record.mode,
            returncode: record.returncode,
            duration_ms: record.duration_ms,
            output: record.output.map(truncate_output),
            operator: record.operator.map(str::to_owned),
            category: Some(operation.category()),
            destructive: operation.destructive(),
        };

        self.repository.append(&entry).await?;
        Ok(entry)
    }

    /// Returns the most recent successful execution of one operation.
    pub async fn last_success(&self, key: &RouteKey) -> AppResult<Option<AuditEntry>> {
        let history = self
            .repository
            .read_history(&AuditHistoryQuery {
                limit: usize::MAX,
                resource: Some(key.resource().to_owned()),
                since: None,
            })
            .await?;

        Ok(history.into_iter().find(|entry| {
            entry.provider == key.provider() && entry.action == key.action() && entry.is_success()
        }))
    }

    /// Removes every entry.
    pub async fn clear(&self) -> AppResult<()> {
        self.repository.clear().await
    }
}
