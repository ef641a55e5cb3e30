use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use opsgate_application::DeployLockRepository;
use opsgate_core::{AppError, AppResult};
use opsgate_domain::LockState;
use tracing::warn;

/// Deployment lock persisted as a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileDeployLockRepository {
    path: PathBuf,
}

impl JsonFileDeployLockRepository {
    /// Creates a repository backed by the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DeployLockRepository for JsonFileDeployLockRepository {
    async fn load(&self) -> AppResult<LockState> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(LockState::unlocked()),
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to read deploy lock '{}': {error}",
                    self.path.display()
                )));
            }
        };

        match serde_json::from_slice::<LockState>(&raw) {
            Ok(state) => Ok(state),
            Err(error) => {
                warn!(
                    path = %self.path.display(),
                    error = %error,
                    "deploy lock file is corrupt, treating as unlocked"
                );
                Ok(LockState::unlocked())
            }
        }
    }

    async fn save(&self, state: &LockState) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                AppError::Internal(format!(
                    "failed to create deploy lock directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }

        let payload = serde_json::to_vec_pretty(state).map_err(|error| {
            AppError::Internal(format!("failed to serialize deploy lock: {error}"))
        })?;

        // Readers never observe a partially written document.
        let staging = self.path.with_extension("json.tmp");
        tokio::fs::write(&staging, payload).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to write deploy lock '{}': {error}",
                staging.display()
            ))
        })?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to replace deploy lock '{}': {error}",
                    self.path.display()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use opsgate_application::DeployLockRepository;
    use opsgate_domain::LockState;

    use super::JsonFileDeployLockRepository;

    fn temp_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn missing_file_reads_unlocked() {
        let dir = temp_dir();
        let repository = JsonFileDeployLockRepository::new(dir.path().join("lock.json"));
        assert!(repository.load().await.is_ok_and(|state| !state.locked));
    }

    #[tokio::test]
    async fn corrupt_file_reads_unlocked() {
        let dir = temp_dir();
        let path = dir.path().join("lock.json");
        assert!(tokio::fs::write(&path, "{not json").await.is_ok());

        let repository = JsonFileDeployLockRepository::new(path);
        assert!(repository.load().await.is_ok_and(|state| !state.locked));
    }

    #[tokio::test]
    async fn non_utf8_file_reads_unlocked() {
        let dir = temp_dir();
        let path = dir.path().join("lock.json");
        assert!(tokio::fs::write(&path, b"{\"locked\": tr\xff\xfe").await.is_ok());

        let repository = JsonFileDeployLockRepository::new(path);
        assert!(repository.load().await.is_ok_and(|state| !state.locked));
    }

    #[tokio::test]
    async fn saved_state_survives_a_new_repository() {
        let dir = temp_dir();
        let path = dir.path().join("nested").join("lock.json");
        let now = Utc::now();
        let state = LockState::held_by("alice", now, now + Duration::seconds(3600));

        let saved = JsonFileDeployLockRepository::new(path.clone())
            .save(&state)
            .await;
        assert!(saved.is_ok());

        let loaded = JsonFileDeployLockRepository::new(path).load().await;
        assert!(loaded.is_ok());
        let loaded = loaded.unwrap_or_else(|_| unreachable!());
        assert_eq!(loaded.holder(), Some("alice"));
        assert_eq!(
            loaded.expires_at.map(|value| value.timestamp()),
            state.expires_at.map(|value| value.timestamp())
        );
    }
}
