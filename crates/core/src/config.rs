use std::env;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::types::Cycle;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub scheduler: SchedulerConfig,
    pub settlement: SettlementDefaults,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            redis: RedisConfig::from_env(),
            scheduler: SchedulerConfig::from_env(),
            settlement: SettlementDefaults::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  server:     {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  redis:      {}:{}/{} (timeout {}ms)",
            self.redis.host,
            self.redis.port,
            self.redis.db,
            self.redis.timeout_ms
        );
        tracing::info!("  scheduler:  tick every {}s", self.scheduler.tick_interval_secs);
        tracing::info!(
            "  settlement: default {} at {}",
            self.settlement.default_cycle,
            self.settlement.default_time
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("API_HOST", "0.0.0.0"),
            port: env_u16("API_PORT", 3001),
            cors_origin: env_or("CORS_ORIGIN", "*"),
        }
    }
}

// ── Redis ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub db: u16,
    /// Upper bound applied to every store call.
    pub timeout_ms: u64,
}

impl RedisConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("REDIS_HOST", "127.0.0.1"),
            port: env_u16("REDIS_PORT", 6379),
            db: env_u16("REDIS_DB", 0),
            timeout_ms: env_u64("REDIS_TIMEOUT_MS", 2_000),
        }
    }

    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

// ── Settlement scheduler ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub tick_interval_secs: u64,
}

impl SchedulerConfig {
    fn from_env() -> Self {
        Self {
            tick_interval_secs: env_u64("SETTLEMENT_TICK_SECS", 60),
        }
    }
}

// ── Scheduled-leaderboard defaults ────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementDefaults {
    /// Used when a creation request omits `settlement_time`.
    pub default_time: NaiveTime,
    /// Used when a creation request omits `settlement_cycle`.
    pub default_cycle: Cycle,
    pub supported_cycles: Vec<Cycle>,
}

impl SettlementDefaults {
    fn from_env() -> Self {
        let default_time = NaiveTime::from_str(&env_or("DEFAULT_SETTLEMENT_TIME", "00:00:00"))
            .unwrap_or_else(|_| NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        let default_cycle = env_or("DEFAULT_SETTLEMENT_CYCLE", "daily")
            .parse()
            .unwrap_or(Cycle::Daily);
        Self {
            default_time,
            default_cycle,
            supported_cycles: Cycle::SUPPORTED.to_vec(),
        }
    }
}
