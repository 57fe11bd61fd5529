//! Store error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store call timed out after {0}ms")]
    Timeout(u64),

    #[error("key not found: {0}")]
    NotFound(String),

    #[error("corrupt config entry: {0}")]
    CorruptConfig(String),
}

impl StoreError {
    /// Transient transport/timeout failures; the scheduler retries these on
    /// the next tick instead of treating them as fatal.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}
