use async_trait::async_trait;
use opsgate_core::AppResult;
use opsgate_domain::LockState;

/// Port for the persisted deployment lock singleton.
#[async_trait]
pub trait DeployLockRepository: Send + Sync {
    /// Loads the persisted state.
    ///
    /// Missing or corrupt storage yields the unlocked state.
    async fn load(&self) -> AppResult<LockState>;

    /// Persists the state, replacing what was stored.
    async fn save(&self, state: &LockState) -> AppResult<()>;
}
