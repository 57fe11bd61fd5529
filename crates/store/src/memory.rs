//! In-memory backend.
//!
//! Implements the same contracts as the Redis backend over plain maps behind
//! a mutex. Used by unit tests and local development; ranking semantics
//! mirror Redis (descending score, ties in reverse member order).

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::traits::{HashStore, RankedStore};

#[derive(Default)]
struct Inner {
    zsets: HashMap<String, HashMap<String, f64>>,
    hashes: HashMap<String, HashMap<String, String>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Members sorted the way ZREVRANGE returns them.
fn sorted_desc(set: &HashMap<String, f64>) -> Vec<(String, f64)> {
    let mut entries: Vec<(String, f64)> = set.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.0.cmp(&a.0))
    });
    entries
}

#[async_trait]
impl RankedStore for MemoryStore {
    async fn update_score(&self, set: &str, user: &str, score: f64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner
            .zsets
            .entry(set.to_string())
            .or_default()
            .insert(user.to_string(), score);
        Ok(())
    }

    async fn score(&self, set: &str, user: &str) -> Result<Option<f64>, StoreError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner.zsets.get(set).and_then(|s| s.get(user).copied()))
    }

    async fn rank(&self, set: &str, user: &str) -> Result<Option<u64>, StoreError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let Some(members) = inner.zsets.get(set) else {
            return Ok(None);
        };
        Ok(sorted_desc(members)
            .iter()
            .position(|(u, _)| u == user)
            .map(|i| i as u64 + 1))
    }

    async fn top_n(&self, set: &str, n: u64) -> Result<Vec<(String, f64)>, StoreError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        let Some(members) = inner.zsets.get(set) else {
            return Ok(Vec::new());
        };
        Ok(sorted_desc(members).into_iter().take(n as usize).collect())
    }

    async fn cardinality(&self, set: &str) -> Result<u64, StoreError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner.zsets.get(set).map(|s| s.len() as u64).unwrap_or(0))
    }

    async fn remove(&self, set: &str, user: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        if let Some(members) = inner.zsets.get_mut(set) {
            members.remove(user);
        }
        Ok(())
    }

    async fn delete(&self, set: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.zsets.remove(set);
        Ok(())
    }

    async fn rename(&self, old: &str, new: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        match inner.zsets.remove(old) {
            Some(members) => {
                inner.zsets.insert(new.to_string(), members);
                Ok(())
            }
            None => Err(StoreError::NotFound(old.to_string())),
        }
    }
}

#[async_trait]
impl HashStore for MemoryStore {
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner.hashes.get(key).and_then(|h| h.get(field).cloned()))
    }

    async fn hash_get_all(&self, key: &str) -> Result<Vec<(String, String)>, StoreError> {
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner
            .hashes
            .get(key)
            .map(|h| h.iter().map(|(f, v)| (f.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn hash_del(&self, key: &str, field: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        if let Some(hash) = inner.hashes.get_mut(key) {
            hash.remove(field);
        }
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        field: &str,
        expected: &str,
        new: &str,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let hash = inner.hashes.entry(key.to_string()).or_default();
        let current = hash.get(field).map(String::as_str).unwrap_or("");
        if current == expected {
            hash.insert(field.to_string(), new.to_string());
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
