//! Stateless ranked view over one ordered set.

use std::sync::Arc;

use rankd_core::types::RankedEntry;
use rankd_store::{Store, StoreError};

/// A leaderboard backed by a single ordered-set key.
///
/// Carries no lifecycle state of its own; [`ScheduledLeaderboard`] holds one
/// of these pointed at its current-period key, and the plain leaderboard API
/// uses them directly.
///
/// [`ScheduledLeaderboard`]: crate::scheduled::ScheduledLeaderboard
#[derive(Clone)]
pub struct Leaderboard {
    store: Arc<dyn Store>,
    set: String,
}

impl Leaderboard {
    pub fn new(store: Arc<dyn Store>, set: impl Into<String>) -> Self {
        Self {
            store,
            set: set.into(),
        }
    }

    /// The ordered-set key this view reads and writes.
    pub fn set_key(&self) -> &str {
        &self.set
    }

    pub async fn update_score(&self, user: &str, score: f64) -> Result<(), StoreError> {
        self.store.update_score(&self.set, user, score).await
    }

    pub async fn score(&self, user: &str) -> Result<Option<f64>, StoreError> {
        self.store.score(&self.set, user).await
    }

    /// 1-based rank by descending score; `None` for users with no entry.
    pub async fn rank(&self, user: &str) -> Result<Option<u64>, StoreError> {
        self.store.rank(&self.set, user).await
    }

    /// Top `n` entries, strictly descending by score with contiguous ranks.
    pub async fn top_n(&self, n: u64) -> Result<Vec<RankedEntry>, StoreError> {
        let entries = self.store.top_n(&self.set, n).await?;
        Ok(entries
            .into_iter()
            .enumerate()
            .map(|(i, (user_id, score))| RankedEntry {
                user_id,
                score,
                rank: i as u64 + 1,
            })
            .collect())
    }

    pub async fn user_count(&self) -> Result<u64, StoreError> {
        self.store.cardinality(&self.set).await
    }

    pub async fn remove_user(&self, user: &str) -> Result<(), StoreError> {
        self.store.remove(&self.set, user).await
    }

    /// Delete every entry in the set.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.store.delete(&self.set).await
    }
}
