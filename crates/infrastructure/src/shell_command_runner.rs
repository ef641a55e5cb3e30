use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use opsgate_application::{CommandOutput, CommandRunner};
use opsgate_core::{AppError, AppResult};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Runs resolved catalog commands through `sh -c`.
#[derive(Debug, Clone)]
pub struct ShellCommandRunner {
    shell: String,
}

impl ShellCommandRunner {
    /// Creates a runner using `sh`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shell: "sh".to_owned(),
        }
    }
}

impl Default for ShellCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

fn capture<R>(pipe: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(error) = pipe.read_to_end(&mut buffer).await {
                debug!(error = %error, "command output pipe closed with error");
            }
        }
        String::from_utf8_lossy(&buffer).into_owned()
    })
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(&self, command: &str, timeout: Duration) -> AppResult<CommandOutput> {
        let started = Instant::now();
        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| {
                AppError::Internal(format!("failed to spawn command '{command}': {error}"))
            })?;

        let mut stdout = capture(child.stdout.take());
        let mut stderr = capture(child.stderr.take());

        // Background children can hold the pipes open after the shell exits,
        // so the deadline covers draining output as well as the exit status.
        let completed = tokio::time::timeout(timeout, async {
            let status = child.wait().await?;
            let stdout = (&mut stdout).await.unwrap_or_default();
            let stderr = (&mut stderr).await.unwrap_or_default();
            Ok::<_, std::io::Error>((status, stdout, stderr))
        })
        .await;

        match completed {
            Ok(Ok((status, stdout, stderr))) => Ok(CommandOutput {
                stdout,
                stderr,
                returncode: status
                    .code()
                    .unwrap_or(CommandOutput::TIMEOUT_RETURNCODE),
                duration_ms: elapsed_ms(started),
            }),
            Ok(Err(error)) => {
                stdout.abort();
                stderr.abort();
                Err(AppError::Internal(format!(
                    "failed to wait for command '{command}': {error}"
                )))
            }
            Err(_) => {
                warn!(command, timeout_secs = timeout.as_secs(), "command timed out");
                if let Err(error) = child.kill().await {
                    warn!(command, error = %error, "failed to kill timed out command");
                }
                stdout.abort();
                stderr.abort();
                Ok(CommandOutput::timed_out(timeout, elapsed_ms(started)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use opsgate_application::{CommandOutput, CommandRunner};

    use super::ShellCommandRunner;

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let output = ShellCommandRunner::new().run("echo hello", TIMEOUT).await;
        assert!(output.is_ok());
        let output = output.unwrap_or_else(|_| unreachable!());
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.returncode, 0);
        assert!(output.succeeded());
    }

    #[tokio::test]
    async fn falls_back_to_stderr_and_reports_failure() {
        let output = ShellCommandRunner::new()
            .run("echo broken >&2; exit 3", TIMEOUT)
            .await;
        assert!(output.is_ok());
        let output = output.unwrap_or_else(|_| unreachable!());
        assert_eq!(output.returncode, 3);
        assert_eq!(output.combined_output().trim(), "broken");
    }

    #[tokio::test]
    async fn timed_out_command_is_killed_with_sentinel_code() {
        let output = ShellCommandRunner::new()
            .run("sleep 5", Duration::from_millis(200))
            .await;
        assert!(output.is_ok());
        let output = output.unwrap_or_else(|_| unreachable!());
        assert_eq!(output.returncode, CommandOutput::TIMEOUT_RETURNCODE);
        assert!(output.stderr.starts_with("Command timed out after"));
        assert!(output.duration_ms < 5000);
    }
    #[tokio::test]
    async fn deadline_covers_output_held_open_by_background_child() {
        let started = std::time::Instant::now();
        let output = ShellCommandRunner::new()
            .run("sleep 4 & echo hi", Duration::from_millis(300))
            .await;
        assert!(output.is_ok());
        let output = output.unwrap_or_else(|_| unreachable!());
        assert_eq!(output.returncode, CommandOutput::TIMEOUT_RETURNCODE);
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
