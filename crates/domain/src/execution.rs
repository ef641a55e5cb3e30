use serde::{Deserialize, Serialize};

/// Whether a request only shows commands or actually runs them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Commands are returned without execution.
    #[default]
    Mock,
    /// Commands are executed against infrastructure.
    Live,
}

impl ExecutionMode {
    /// Returns the stable mode name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Live => "live",
        }
    }

    /// Returns whether commands may run.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}
