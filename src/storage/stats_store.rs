//! Typed persistence for user stats and unlock records.
//!
//! Loads fail soft: missing or corrupt state falls back to the zero-valued
//! default so a damaged store never takes the app down. Writes go through
//! `PersistenceAdapter::put_many`, so stats, unlock records, and the
//! progress cache survive or fail together.

use crate::badges::types::{BadgeProgress, UnlockedBadge};
use crate::stats::UserStats;
use crate::storage::store::{PersistenceAdapter, StoreError};

/// Storage key for the serialized `UserStats`.
pub const KEY_USER_STATS: &str = "user_stats";
/// Storage key for the list of `UnlockedBadge` records.
pub const KEY_USER_BADGES: &str = "user_badges";
/// Storage key for the cached progress snapshot.
pub const KEY_BADGE_PROGRESS: &str = "badge_progress";

/// Typed facade over a `PersistenceAdapter` for engine state.
pub struct UserStatsStore<S: PersistenceAdapter> {
    store: S,
}

impl<S: PersistenceAdapter> UserStatsStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load user stats, falling back to the zero default when the key is
    /// absent or the payload does not parse.
    pub fn load_stats(&self) -> Result<UserStats, StoreError> {
        match self.store.get(KEY_USER_STATS)? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(stats) => Ok(stats),
                Err(e) => {
                    tracing::warn!("Corrupt user stats, falling back to defaults: {}", e);
                    Ok(UserStats::default())
                }
            },
            None => Ok(UserStats::default()),
        }
    }

    /// Load unlock records with the same fail-soft contract.
    pub fn load_unlocked(&self) -> Result<Vec<UnlockedBadge>, StoreError> {
        match self.store.get(KEY_USER_BADGES)? {
            Some(json) => match serde_json::from_str(&json) {
                Ok(unlocked) => Ok(unlocked),
                Err(e) => {
                    tracing::warn!("Corrupt unlock records, falling back to empty set: {}", e);
                    Ok(Vec::new())
                }
            },
            None => Ok(Vec::new()),
        }
    }

    /// Persist stats, unlock records, and the progress cache in one atomic
    /// write.
    pub fn persist(
        &mut self,
        stats: &UserStats,
        unlocked: &[UnlockedBadge],
        progress: &[BadgeProgress],
    ) -> Result<(), StoreError> {
        let stats_json = serde_json::to_string(stats)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        let badges_json = serde_json::to_string(unlocked)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        let progress_json = serde_json::to_string(progress)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        self.store.put_many(&[
            (KEY_USER_STATS, stats_json),
            (KEY_USER_BADGES, badges_json),
            (KEY_BADGE_PROGRESS, progress_json),
        ])
    }

    /// Remove all persisted engine state.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.store
            .remove_many(&[KEY_USER_STATS, KEY_USER_BADGES, KEY_BADGE_PROGRESS])
    }
}
