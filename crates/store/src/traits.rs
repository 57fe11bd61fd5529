//! Trait contracts over the external storage primitives.
//!
//! Split along the two primitives the service consumes: a keyed ordered set
//! ([`RankedStore`]) for score data, and a durable hash ([`HashStore`]) for
//! configuration, lifecycle metadata, and settlement history. Backends
//! implement both; components hold an `Arc<dyn Store>`.

use async_trait::async_trait;

use crate::error::StoreError;

// ── Ordered-set primitive ───────────────────────────────────────────

/// Contract over a keyed ordered-set store (scores descending).
///
/// All operations are single-key atomic at the store level; no multi-key
/// transactions are assumed. Ties within a score are broken by the backend's
/// default member ordering.
#[async_trait]
pub trait RankedStore: Send + Sync {
    /// Insert or update `user`'s score in `set`.
    async fn update_score(&self, set: &str, user: &str, score: f64) -> Result<(), StoreError>;

    /// Current score for `user`, or `None` if absent.
    async fn score(&self, set: &str, user: &str) -> Result<Option<f64>, StoreError>;

    /// 1-based rank of `user` by descending score, or `None` if absent.
    async fn rank(&self, set: &str, user: &str) -> Result<Option<u64>, StoreError>;

    /// Top `n` members by descending score, `(user, score)` pairs.
    /// Returns `min(n, cardinality)` entries.
    async fn top_n(&self, set: &str, n: u64) -> Result<Vec<(String, f64)>, StoreError>;

    /// Number of members in `set` (0 if the set does not exist).
    async fn cardinality(&self, set: &str) -> Result<u64, StoreError>;

    /// Remove `user` from `set`. No-op if absent.
    async fn remove(&self, set: &str, user: &str) -> Result<(), StoreError>;

    /// Delete the whole set. No-op if absent.
    async fn delete(&self, set: &str) -> Result<(), StoreError>;

    /// Atomically rename `old` to `new`, overwriting `new` if it exists.
    /// Fails with [`StoreError::NotFound`] when `old` is absent.
    async fn rename(&self, old: &str, new: &str) -> Result<(), StoreError>;
}

// ── Durable hash primitive ──────────────────────────────────────────

/// Contract over a durable field/value hash keyed by collection name.
#[async_trait]
pub trait HashStore: Send + Sync {
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    /// All fields of `key`, unordered. Empty if the hash does not exist.
    async fn hash_get_all(&self, key: &str) -> Result<Vec<(String, String)>, StoreError>;

    async fn hash_del(&self, key: &str, field: &str) -> Result<(), StoreError>;

    /// Atomically set `field` to `new` iff its current value equals
    /// `expected` (empty string matches an absent field). Returns whether
    /// the swap happened.
    ///
    /// Every lifecycle transition goes through this so that concurrent
    /// reconstructions of the same leaderboard cannot double-apply one.
    async fn compare_and_swap(
        &self,
        key: &str,
        field: &str,
        expected: &str,
        new: &str,
    ) -> Result<bool, StoreError>;
}

/// Combined backend contract: everything the service needs from storage.
pub trait Store: RankedStore + HashStore {}

impl<T: RankedStore + HashStore> Store for T {}
