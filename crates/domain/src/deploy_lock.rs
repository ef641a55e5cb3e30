use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp::epoch_seconds_option;

/// Default deployment lock lifetime.
pub const DEFAULT_LOCK_TTL_SECONDS: u64 = 3600;

/// Persisted deployment lock singleton.
///
/// An expired lock (`now > expires_at`) is equivalent to unlocked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockState {
    /// Whether an operator currently holds the lock.
    #[serde(default)]
    pub locked: bool,
    /// Current holder.
    #[serde(default)]
    pub operator: Option<String>,
    /// When the lock was acquired.
    #[serde(default, with = "epoch_seconds_option")]
    pub acquired_at: Option<DateTime<Utc>>,
    /// When the lock lapses.
    #[serde(default, with = "epoch_seconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl LockState {
    /// Returns the unlocked state.
    #[must_use]
    pub fn unlocked() -> Self {
        Self::default()
    }

    /// Returns a state held by `operator` between the two instants.
    #[must_use]
    pub fn held_by(
        operator: impl Into<String>,
        acquired_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            locked: true,
            operator: Some(operator.into()),
            acquired_at: Some(acquired_at),
            expires_at: Some(expires_at),
        }
    }

    /// Returns whether the state is a lock whose lifetime has passed.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.locked && self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    /// Returns the current holder, if locked.
    #[must_use]
    pub fn holder(&self) -> Option<&str> {
        if self.locked {
            self.operator.as_deref()
        } else {
            None
        }
    }

    /// Returns whether the lock is held by anyone other than `operator`.
    ///
    /// An anonymous caller (`None`) never owns the lock.
    #[must_use]
    pub fn is_held_by_other(&self, operator: Option<&str>) -> bool {
        if !self.locked {
            return false;
        }

        !operator.is_some_and(|operator| self.operator.as_deref() == Some(operator))
    }
}
