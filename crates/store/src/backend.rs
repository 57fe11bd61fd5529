//! Redis backend.
//!
//! One explicit client object per process, created at startup and passed to
//! every component at construction. Wraps a multiplexed async connection;
//! every call carries a bounded timeout so a stalled Redis cannot wedge the
//! scheduler tick or a request handler.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use rankd_core::config::RedisConfig;

use crate::error::StoreError;
use crate::traits::{HashStore, RankedStore};

/// Compare-and-swap on one hash field. An absent field compares equal to the
/// empty string so first-time initialization can race safely.
const CAS_SCRIPT: &str = r#"
local cur = redis.call('HGET', KEYS[1], ARGV[1])
if cur == false then cur = '' end
if cur == ARGV[2] then
    redis.call('HSET', KEYS[1], ARGV[1], ARGV[3])
    return 1
end
return 0
"#;

pub struct RedisStore {
    con: redis::aio::MultiplexedConnection,
    timeout: Duration,
    cas: redis::Script,
}

impl RedisStore {
    /// Connect to Redis using the given config. Fails fast if the server is
    /// unreachable rather than deferring the error to the first call.
    pub async fn connect(config: &RedisConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(config.url())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let con = tokio::time::timeout(
            Duration::from_millis(config.timeout_ms),
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| StoreError::Timeout(config.timeout_ms))?
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        tracing::info!("Connected to redis at {}", config.url());

        Ok(Self {
            con,
            timeout: Duration::from_millis(config.timeout_ms),
            cas: redis::Script::new(CAS_SCRIPT),
        })
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }

    /// Run a redis future under the configured timeout.
    async fn call<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(StoreError::Unavailable(e.to_string())),
            Err(_) => Err(StoreError::Timeout(self.timeout_ms())),
        }
    }
}

fn is_no_such_key(e: &redis::RedisError) -> bool {
    e.kind() == redis::ErrorKind::ResponseError && e.to_string().contains("no such key")
}

/// Inclusive ZREVRANGE stop index for a top-`n` query (`n >= 1`). Clamped so
/// an oversized `n` cannot wrap into negative count-from-the-end indexing.
fn zrevrange_stop(n: u64) -> isize {
    n.min(isize::MAX as u64) as isize - 1
}

#[async_trait]
impl RankedStore for RedisStore {
    async fn update_score(&self, set: &str, user: &str, score: f64) -> Result<(), StoreError> {
        let mut con = self.con.clone();
        let (set, user) = (set.to_string(), user.to_string());
        self.call(async move { con.zadd::<_, _, _, ()>(set, user, score).await })
            .await
    }

    async fn score(&self, set: &str, user: &str) -> Result<Option<f64>, StoreError> {
        let mut con = self.con.clone();
        let (set, user) = (set.to_string(), user.to_string());
        self.call(async move { con.zscore::<_, _, Option<f64>>(set, user).await })
            .await
    }

    async fn rank(&self, set: &str, user: &str) -> Result<Option<u64>, StoreError> {
        let mut con = self.con.clone();
        let (set, user) = (set.to_string(), user.to_string());
        let zero_based = self
            .call(async move { con.zrevrank::<_, _, Option<u64>>(set, user).await })
            .await?;
        Ok(zero_based.map(|r| r + 1))
    }

    async fn top_n(&self, set: &str, n: u64) -> Result<Vec<(String, f64)>, StoreError> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut con = self.con.clone();
        let set = set.to_string();
        let stop = zrevrange_stop(n);
        self.call(async move {
            con.zrevrange_withscores::<_, Vec<(String, f64)>>(set, 0, stop)
                .await
        })
        .await
    }

    async fn cardinality(&self, set: &str) -> Result<u64, StoreError> {
        let mut con = self.con.clone();
        let set = set.to_string();
        self.call(async move { con.zcard::<_, u64>(set).await }).await
    }

    async fn remove(&self, set: &str, user: &str) -> Result<(), StoreError> {
        let mut con = self.con.clone();
        let (set, user) = (set.to_string(), user.to_string());
        self.call(async move { con.zrem::<_, _, ()>(set, user).await })
            .await
    }

    async fn delete(&self, set: &str) -> Result<(), StoreError> {
        let mut con = self.con.clone();
        let set = set.to_string();
        self.call(async move { con.del::<_, ()>(set).await }).await
    }

    async fn rename(&self, old: &str, new: &str) -> Result<(), StoreError> {
        let mut con = self.con.clone();
        let (old_key, new_key) = (old.to_string(), new.to_string());
        let result = tokio::time::timeout(self.timeout, async move {
            con.rename::<_, _, ()>(old_key, new_key).await
        })
        .await;

        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) if is_no_such_key(&e) => Err(StoreError::NotFound(old.to_string())),
            Ok(Err(e)) => Err(StoreError::Unavailable(e.to_string())),
            Err(_) => Err(StoreError::Timeout(self.timeout_ms())),
        }
    }
}

#[async_trait]
impl HashStore for RedisStore {
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let mut con = self.con.clone();
        let (key, field, value) = (key.to_string(), field.to_string(), value.to_string());
        self.call(async move { con.hset::<_, _, _, ()>(key, field, value).await })
            .await
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        let mut con = self.con.clone();
        let (key, field) = (key.to_string(), field.to_string());
        self.call(async move { con.hget::<_, _, Option<String>>(key, field).await })
            .await
    }

    async fn hash_get_all(&self, key: &str) -> Result<Vec<(String, String)>, StoreError> {
        let mut con = self.con.clone();
        let key = key.to_string();
        self.call(async move { con.hgetall::<_, Vec<(String, String)>>(key).await })
            .await
    }

    async fn hash_del(&self, key: &str, field: &str) -> Result<(), StoreError> {
        let mut con = self.con.clone();
        let (key, field) = (key.to_string(), field.to_string());
        self.call(async move { con.hdel::<_, _, ()>(key, field).await })
            .await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        field: &str,
        expected: &str,
        new: &str,
    ) -> Result<bool, StoreError> {
        let mut con = self.con.clone();
        let mut invocation = self.cas.prepare_invoke();
        invocation.key(key).arg(field).arg(expected).arg(new);
        let result = tokio::time::timeout(self.timeout, async {
            let swapped: i64 = invocation.invoke_async(&mut con).await?;
            Ok::<i64, redis::RedisError>(swapped)
        })
        .await;

        match result {
            Ok(Ok(swapped)) => Ok(swapped == 1),
            Ok(Err(e)) => Err(StoreError::Unavailable(e.to_string())),
            Err(_) => Err(StoreError::Timeout(self.timeout_ms())),
        }
    }
}
