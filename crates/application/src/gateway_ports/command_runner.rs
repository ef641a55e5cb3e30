use std::time::Duration;

use async_trait::async_trait;
use opsgate_core::AppResult;

/// Captured result of one out-of-process command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Process exit code, [`CommandOutput::TIMEOUT_RETURNCODE`] on timeout.
    pub returncode: i32,
    /// Wall time in milliseconds.
    pub duration_ms: u64,
}

impl CommandOutput {
    /// Exit code reported for commands killed after their timeout.
    pub const TIMEOUT_RETURNCODE: i32 = -1;

    /// Builds the synthetic result for a command killed after `timeout`.
    #[must_use]
    pub fn timed_out(timeout: Duration, duration_ms: u64) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!("Command timed out after {}s", timeout.as_secs()),
            returncode: Self::TIMEOUT_RETURNCODE,
            duration_ms,
        }
    }

    /// Returns whether the command exited with status zero.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.returncode == 0
    }

    /// Returns stdout, or stderr when stdout is empty.
    #[must_use]
    pub fn combined_output(&self) -> &str {
        if self.stdout.is_empty() {
            self.stderr.as_str()
        } else {
            self.stdout.as_str()
        }
    }
}

/// Port for executing one resolved shell command.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command` and waits at most `timeout` for it.
    ///
    /// A timeout is a completed result, not an error. Errors mean the command
    /// could not be started or awaited at all.
    async fn run(&self, command: &str, timeout: Duration) -> AppResult<CommandOutput>;
}
