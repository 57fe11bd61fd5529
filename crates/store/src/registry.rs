//! Durable leaderboard registry.
//!
//! The source of truth for which scheduled leaderboards exist. Entries are
//! JSON-encoded [`LeaderboardConfig`] values in a single well-known hash,
//! keyed by leaderboard name. Entries survive process restarts and are only
//! removed by explicit administrative action.

use std::collections::BTreeMap;
use std::sync::Arc;

use rankd_core::types::LeaderboardConfig;

use crate::error::StoreError;
use crate::traits::Store;

/// Hash holding one field per registered scheduled leaderboard.
pub const REGISTRY_KEY: &str = "leaderboards:config";

#[derive(Clone)]
pub struct Registry {
    store: Arc<dyn Store>,
}

impl Registry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Idempotent upsert. Overwrites an existing entry without validation;
    /// creation-time validation happens before this is called.
    pub async fn put(&self, config: &LeaderboardConfig) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(config)
            .map_err(|e| StoreError::CorruptConfig(e.to_string()))?;
        self.store
            .hash_set(REGISTRY_KEY, &config.name, &encoded)
            .await
    }

    pub async fn get(&self, name: &str) -> Result<Option<LeaderboardConfig>, StoreError> {
        match self.store.hash_get(REGISTRY_KEY, name).await? {
            Some(raw) => {
                let config = serde_json::from_str(&raw).map_err(|e| {
                    StoreError::CorruptConfig(format!("registry entry '{}': {}", name, e))
                })?;
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }

    /// All registered leaderboards, name → config. A malformed entry fails
    /// the whole read with [`StoreError::CorruptConfig`] rather than being
    /// silently dropped.
    pub async fn list_all(&self) -> Result<BTreeMap<String, LeaderboardConfig>, StoreError> {
        let mut configs = BTreeMap::new();
        for (name, raw) in self.store.hash_get_all(REGISTRY_KEY).await? {
            let config: LeaderboardConfig = serde_json::from_str(&raw).map_err(|e| {
                StoreError::CorruptConfig(format!("registry entry '{}': {}", name, e))
            })?;
            configs.insert(name, config);
        }
        Ok(configs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::traits::HashStore;
    use chrono::NaiveTime;
    use rankd_core::types::Cycle;

    fn config(name: &str) -> LeaderboardConfig {
        LeaderboardConfig {
            name: name.to_string(),
            settlement_time: NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
            settlement_cycle: Cycle::Daily,
        }
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let registry = Registry::new(Arc::new(MemoryStore::new()));
        registry.put(&config("daily_race")).await.unwrap();

        let loaded = registry.get("daily_race").await.unwrap().unwrap();
        assert_eq!(loaded, config("daily_race"));
        assert!(registry.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_is_idempotent_upsert() {
        let registry = Registry::new(Arc::new(MemoryStore::new()));
        registry.put(&config("board")).await.unwrap();
        registry.put(&config("board")).await.unwrap();

        assert_eq!(registry.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_all_returns_every_entry() {
        let registry = Registry::new(Arc::new(MemoryStore::new()));
        registry.put(&config("a")).await.unwrap();
        registry.put(&config("b")).await.unwrap();

        let all = registry.list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains_key("a") && all.contains_key("b"));
    }

    #[tokio::test]
    async fn malformed_entry_fails_with_corrupt_config() {
        let store = Arc::new(MemoryStore::new());
        store
            .hash_set(REGISTRY_KEY, "broken", "not json")
            .await
            .unwrap();
        let registry = Registry::new(store);

        assert!(matches!(
            registry.get("broken").await.unwrap_err(),
            StoreError::CorruptConfig(_)
        ));
        assert!(matches!(
            registry.list_all().await.unwrap_err(),
            StoreError::CorruptConfig(_)
        ));
    }
}
