use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::operation::OperationCategory;
use crate::timestamp::epoch_seconds;

/// Maximum number of output characters kept per audit entry.
pub const AUDIT_OUTPUT_LIMIT: usize = 2000;

/// Outcome class recorded for one dispatch decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditMode {
    /// Command was executed.
    Live,
    /// Command was shown without execution.
    Mock,
    /// Command was refused by policy.
    Blocked,
    /// Execution could not be carried out.
    Error,
}

impl AuditMode {
    /// Returns the stable mode name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Mock => "mock",
            Self::Blocked => "blocked",
            Self::Error => "error",
        }
    }
}

/// One immutable line of the deployment audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the decision completed.
    #[serde(with = "epoch_seconds")]
    pub timestamp: DateTime<Utc>,
    /// Resource name.
    pub resource: String,
    /// Provider name.
    pub provider: String,
    /// Action name.
    pub action: String,
    /// Command text.
    pub command: String,
    /// Recorded outcome class.
    pub mode: AuditMode,
    /// Process exit code.
    #[serde(default)]
    pub returncode: Option<i32>,
    /// Execution wall time in milliseconds.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Captured output, at most [`AUDIT_OUTPUT_LIMIT`] characters.
    #[serde(default)]
    pub output: Option<String>,
    /// Operator identity supplied by the caller.
    #[serde(default)]
    pub operator: Option<String>,
    /// Operation category.
    #[serde(default)]
    pub category: Option<OperationCategory>,
    /// Whether the operation is flagged destructive.
    #[serde(default)]
    pub destructive: bool,
}

impl AuditEntry {
    /// Returns whether this entry records a successful execution.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.returncode == Some(0)
    }
}

/// Truncates output to [`AUDIT_OUTPUT_LIMIT`] characters.
#[must_use]
pub fn truncate_output(output: &str) -> String {
    truncate_chars(output, AUDIT_OUTPUT_LIMIT)
}

/// Truncates a string to at most `limit` characters.
#[must_use]
pub fn truncate_chars(value: &str, limit: usize) -> String {
    match value.char_indices().nth(limit) {
        Some((byte_index, _)) => value[..byte_index].to_owned(),
        None => value.to_owned(),
    }
}

/// Audit history filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditHistoryQuery {
    /// Maximum number of entries returned.
    pub limit: usize,
    /// Only entries for this resource.
    pub resource: Option<String>,
    /// Only entries at or after this instant.
    pub since: Option<DateTime<Utc>>,
}

impl Default for AuditHistoryQuery {
    fn default() -> Self {
        Self {
            limit: 100,
            resource: None,
            since: None,
        }
    }
}

impl AuditHistoryQuery {
    /// Applies the filter to entries ordered newest first.
    ///
    /// Entries are chronological, so the scan stops at the first entry older
    /// than `since`.
    #[must_use]
    pub fn collect<I>(&self, newest_first: I) -> Vec<AuditEntry>
    where
        I: IntoIterator<Item = AuditEntry>,
    {
        let mut entries = Vec::new();
        if self.limit == 0 {
            return entries;
        }

        for entry in newest_first {
            if self
                .resource
                .as_deref()
                .is_some_and(|resource| entry.resource != resource)
            {
                continue;
            }
            if self.since.is_some_and(|since| entry.timestamp < since) {
                break;
            }

            entries.push(entry);
            if entries.len() >= self.limit {
                break;
            }
        }

        entries
    }
}
