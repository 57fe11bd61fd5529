//! Leaderboard error types.

use thiserror::Error;

use rankd_store::StoreError;

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("leaderboard not found: {0}")]
    NotFound(String),

    /// Operation illegal for the current lifecycle status, or a lifecycle
    /// transition lost its compare-and-swap to a concurrent caller.
    #[error("{0}")]
    InvalidState(String),

    #[error("unsupported settlement cycle '{0}' (supported: daily, weekly, monthly)")]
    UnsupportedCycle(String),

    #[error("corrupt settlement history: {0}")]
    CorruptHistory(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
