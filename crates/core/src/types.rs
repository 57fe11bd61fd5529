//! Shared domain types: settlement cycles, lifecycle status, leaderboard
//! configuration, and ranked snapshot entries.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

// ── Settlement cycle ──────────────────────────────────────────────

/// Recurrence pattern governing how often a scheduled leaderboard settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cycle {
    Daily,
    Weekly,
    Monthly,
}

impl Cycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cycle::Daily => "daily",
            Cycle::Weekly => "weekly",
            Cycle::Monthly => "monthly",
        }
    }

    /// All cycles this service knows how to schedule.
    pub const SUPPORTED: [Cycle; 3] = [Cycle::Daily, Cycle::Weekly, Cycle::Monthly];
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Cycle::Daily),
            "weekly" => Ok(Cycle::Weekly),
            "monthly" => Ok(Cycle::Monthly),
            other => Err(other.to_string()),
        }
    }
}

// ── Lifecycle status ──────────────────────────────────────────────

/// Scheduled-leaderboard lifecycle state.
///
/// Persisted in the per-leaderboard meta hash; every transition goes through
/// a compare-and-swap on the durable value so concurrent reconstructions
/// observe a consistent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InProgress,
    Settled,
    /// Terminal. Reserved for staleness detection; no transition in this
    /// core currently produces it.
    Expired,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Settled => "settled",
            Status::Expired => "expired",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "in_progress" => Ok(Status::InProgress),
            "settled" => Ok(Status::Settled),
            "expired" => Ok(Status::Expired),
            other => Err(other.to_string()),
        }
    }
}

// ── Leaderboard configuration ─────────────────────────────────────

/// Durable configuration for one scheduled leaderboard.
///
/// Immutable after creation; the registry owns the durable copy, keyed by
/// `name`. Score data and settlement history live at separate keys and
/// survive independently of this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    pub name: String,
    /// Time of day (UTC) at which a cycle becomes due.
    pub settlement_time: NaiveTime,
    pub settlement_cycle: Cycle,
}

// ── Snapshot entries ──────────────────────────────────────────────

/// One ranked participant in a top-N query or settlement snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub user_id: String,
    pub score: f64,
    /// 1-based, contiguous, descending by score.
    pub rank: u64,
}

/// A finalized scoring period: the full ranked snapshot taken at settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRecord {
    /// RFC 3339 settlement instant; also the history hash field.
    pub timestamp: String,
    pub snapshot: Vec<RankedEntry>,
}
