use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use opsgate_application::AuditLogRepository;
use opsgate_core::{AppError, AppResult};
use opsgate_domain::{AuditEntry, AuditHistoryQuery};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

/// Append-only audit log with one JSON document per line.
#[derive(Debug)]
pub struct JsonlAuditLogRepository {
    path: PathBuf,
    write_guard: Mutex<()>,
}

impl JsonlAuditLogRepository {
    /// Creates a repository backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_guard: Mutex::new(()),
        }
    }

    fn io_error(&self, operation: &str, error: std::io::Error) -> AppError {
        AppError::Internal(format!(
            "failed to {operation} audit log '{}': {error}",
            self.path.display()
        ))
    }
}

#[async_trait]
impl AuditLogRepository for JsonlAuditLogRepository {
    async fn append(&self, entry: &AuditEntry) -> AppResult<()> {
        let mut line = serde_json::to_vec(entry).map_err(|error| {
            AppError::Internal(format!("failed to serialize audit entry: {error}"))
        })?;
        line.push(b'\n');

        let _guard = self.write_guard.lock().await;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| self.io_error("create directory for", error))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|error| self.io_error("open", error))?;
        file.write_all(&line)
            .await
            .map_err(|error| self.io_error("append to", error))?;
        file.flush()
            .await
            .map_err(|error| self.io_error("flush", error))
    }

    async fn read_history(&self, query: &AuditHistoryQuery) -> AppResult<Vec<AuditEntry>> {
        // Lines are decoded individually so a stray non-UTF-8 byte costs one entry.
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(self.io_error("read", error)),
        };

        let mut skipped = 0_usize;
        let newest_first = raw
            .split(|byte| *byte == b'\n')
            .rev()
            .map(<[u8]>::trim_ascii)
            .filter(|line| !line.is_empty())
            .filter_map(|line| match serde_json::from_slice::<AuditEntry>(line) {
                Ok(entry) => Some(entry),
                Err(_) => {
                    skipped += 1;
                    None
                }
            });
        let entries = query.collect(newest_first);

        if skipped > 0 {
            warn!(path = %self.path.display(), skipped, "skipped malformed audit log lines");
        }
        Ok(entries)
    }

    async fn clear(&self) -> AppResult<()> {
        let _guard = self.write_guard.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(self.io_error("remove", error)),
        }
    }
}
