use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use opsgate_core::{AppError, AppResult};
use opsgate_domain::LockState;
use tokio::sync::Mutex;
use tracing::info;

use crate::gateway_ports::DeployLockRepository;

/// Result of an acquire or release attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockAttempt {
    /// Whether the attempt changed or confirmed the requested state.
    pub granted: bool,
    /// Lock state after the attempt.
    pub state: LockState,
}

/// Application service coordinating the single deployment lock.
///
/// Every call re-reads durable storage; read-modify-write sequences within
/// this process are serialized.
#[derive(Clone)]
pub struct DeployLockService {
    repository: Arc<dyn DeployLockRepository>,
    guard: Arc<Mutex<()>>,
}

impl DeployLockService {
    /// Creates a deployment lock service.
    #[must_use]
    pub fn new(repository: Arc<dyn DeployLockRepository>) -> Self {
        Self {
            repository,
            guard: Arc::new(Mutex::new(())),
        }
    }

    /// Acquires the lock for `operator` for `ttl`.
    ///
    /// A live lock, even one held by the same operator, is not replaced.
    pub async fn acquire(&self, operator: &str, ttl: Duration) -> AppResult<LockAttempt> {
        if operator.trim().is_empty() {
            return Err(AppError::Validation(
                "operator must not be empty".to_owned(),
            ));
        }

        let ttl = chrono::Duration::from_std(ttl)
            .ok()
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or_else(|| {
                AppError::Validation("lock ttl must be a positive number of seconds".to_owned())
            })?;

        let _guard = self.guard.lock().await;
        let state = self.current_state().await?;
        if state.locked {
            return Ok(LockAttempt {
                granted: false,
                state,
            });
        }

        let acquired_at = Utc::now();
        let expires_at = acquired_at
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::Validation("lock ttl is out of range".to_owned()))?;
        let state = LockState::held_by(operator, acquired_at, expires_at);
        self.repository.save(&state).await?;
        info!(operator, expires_at = %expires_at, "deployment lock acquired");

        Ok(LockAttempt {
            granted: true,
            state,
        })
    }

    /// Releases the lock.
    ///
    /// `None` force-releases regardless of holder. A named operator may only
    /// release its own lock.
    pub async fn release(&self, operator: Option<&str>) -> AppResult<LockAttempt> {
        let _guard = self.guard.lock().await;
        let state = self.current_state().await?;
        if !state.locked {
            return Ok(LockAttempt {
                granted: true,
                state,
            });
        }

        if operator.is_some() && state.is_held_by_other(operator) {
            return Ok(LockAttempt {
                granted: false,
                state,
            });
        }

        let released = LockState::unlocked();
        self.repository.save(&released).await?;
        info!(
            holder = state.holder().unwrap_or_default(),
            forced = operator.is_none(),
            "deployment lock released"
        );

        Ok(LockAttempt {
            granted: true,
            state: released,
        })
    }

    /// Returns the current lock state with expiry applied.
    pub async fn status(&self) -> AppResult<LockState> {
        let _guard = self.guard.lock().await;
        self.current_state().await
    }

    /// Returns whether a live lock is held by someone other than `operator`.
    pub async fn is_locked_by_other(&self, operator: Option<&str>) -> AppResult<bool> {
        Ok(self.status().await?.is_held_by_other(operator))
    }

    async fn current_state(&self) -> AppResult<LockState> {
        let state = self.repository.load().await?;
        if !state.is_expired_at(Utc::now()) {
            return Ok(state);
        }

        info!(
            holder = state.holder().unwrap_or_default(),
            "deployment lock expired"
        );
        let released = LockState::unlocked();
        self.repository.save(&released).await?;
        Ok(released)
    }
}
