//! Scheduled-leaderboard lifecycle.
//!
//! A [`ScheduledLeaderboard`] is a transient view reconstructed from its
//! registry config plus durable lifecycle metadata. The durable copy of the
//! status lives in the `<name>:meta` hash and every transition goes through a
//! compare-and-swap on it, so an API request and a scheduler tick racing on
//! the same leaderboard cannot double-apply a transition.
//!
//! Key layout per leaderboard `name`:
//! - `name`          — base set; scores written before the first period start
//! - `name:current`  — active score set for the in-progress cycle
//! - `name:history`  — settlement history hash, field = RFC 3339 timestamp
//! - `name:meta`     — lifecycle hash: `status`, `settles_at`

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveTime, SecondsFormat, Utc};
use tracing::{debug, info, warn};

use rankd_core::types::{Cycle, LeaderboardConfig, RankedEntry, SettlementRecord, Status};
use rankd_store::{Registry, Store, StoreError};

use crate::error::LeaderboardError;
use crate::schedule;
use crate::view::Leaderboard;

const META_STATUS: &str = "status";
const META_SETTLES_AT: &str = "settles_at";

fn current_key(name: &str) -> String {
    format!("{}:current", name)
}

fn history_key(name: &str) -> String {
    format!("{}:history", name)
}

fn meta_key(name: &str) -> String {
    format!("{}:meta", name)
}

pub struct ScheduledLeaderboard {
    store: Arc<dyn Store>,
    config: LeaderboardConfig,
    status: Status,
    settles_at: Option<DateTime<Utc>>,
    /// Ranked view over the current-period set.
    view: Leaderboard,
}

impl std::fmt::Debug for ScheduledLeaderboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledLeaderboard")
            .field("config", &self.config)
            .field("status", &self.status)
            .field("settles_at", &self.settles_at)
            .finish_non_exhaustive()
    }
}

impl ScheduledLeaderboard {
    /// Validate and persist a new scheduled leaderboard.
    ///
    /// Rejects cycles outside `supported` with
    /// [`LeaderboardError::UnsupportedCycle`] before any state is created.
    /// The registry put is an idempotent upsert; the durable status is
    /// initialized to `pending` only when no status exists yet, so
    /// re-creating an existing name never resets a live period.
    pub async fn create(
        store: Arc<dyn Store>,
        registry: &Registry,
        name: &str,
        settlement_time: NaiveTime,
        settlement_cycle: &str,
        supported: &[Cycle],
    ) -> Result<Self, LeaderboardError> {
        let cycle: Cycle = settlement_cycle
            .parse()
            .map_err(LeaderboardError::UnsupportedCycle)?;
        if !supported.contains(&cycle) {
            return Err(LeaderboardError::UnsupportedCycle(cycle.to_string()));
        }

        let config = LeaderboardConfig {
            name: name.to_string(),
            settlement_time,
            settlement_cycle: cycle,
        };
        registry.put(&config).await?;
        store
            .compare_and_swap(&meta_key(name), META_STATUS, "", Status::Pending.as_str())
            .await?;

        info!(leaderboard = %name, cycle = %cycle, time = %settlement_time, "scheduled leaderboard created");
        Self::load(store, config).await
    }

    /// Reconstruct a leaderboard from its persisted config and durable
    /// lifecycle metadata. A leaderboard with no meta record is `pending`.
    pub async fn load(
        store: Arc<dyn Store>,
        config: LeaderboardConfig,
    ) -> Result<Self, LeaderboardError> {
        let meta = meta_key(&config.name);

        let status = match store.hash_get(&meta, META_STATUS).await? {
            Some(raw) => raw.parse().map_err(|v: String| {
                StoreError::CorruptConfig(format!("status '{}' for '{}'", v, config.name))
            })?,
            None => Status::Pending,
        };

        let settles_at = match store.hash_get(&meta, META_SETTLES_AT).await? {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| {
                        StoreError::CorruptConfig(format!(
                            "settles_at '{}' for '{}': {}",
                            raw, config.name, e
                        ))
                    })?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        let view = Leaderboard::new(store.clone(), current_key(&config.name));
        Ok(Self {
            store,
            config,
            status,
            settles_at,
            view,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &LeaderboardConfig {
        &self.config
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Persisted due instant for the in-progress cycle, if a period has
    /// been started.
    pub fn settles_at(&self) -> Option<DateTime<Utc>> {
        self.settles_at
    }

    /// Ranked view over the current-period set. Reads and maintenance
    /// operations are not status-gated.
    pub fn view(&self) -> &Leaderboard {
        &self.view
    }

    /// Next due instant evaluated at `now`; see [`schedule::next_settlement_time`].
    pub fn next_settlement_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        schedule::next_settlement_time(self.config.settlement_cycle, self.config.settlement_time, now)
    }

    /// Whether the in-progress cycle has elapsed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == Status::InProgress && self.settles_at.is_some_and(|due| now >= due)
    }

    /// Recompute and persist the due instant for an in-progress period whose
    /// durable `settles_at` record is missing, e.g. after a crash between the
    /// status transition and the write that should have recorded it.
    pub async fn restore_due_instant(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, LeaderboardError> {
        let due = self.next_settlement_time(now);
        self.store
            .hash_set(
                &meta_key(&self.config.name),
                META_SETTLES_AT,
                &due.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .await?;
        self.settles_at = Some(due);
        Ok(due)
    }

    /// Accept a score for the in-progress cycle.
    pub async fn update_score(&self, user: &str, score: f64) -> Result<(), LeaderboardError> {
        if self.status != Status::InProgress {
            return Err(LeaderboardError::InvalidState(
                "cannot update score when leaderboard is not in progress".to_string(),
            ));
        }
        self.view.update_score(user, score).await?;
        Ok(())
    }

    /// Open a fresh scoring cycle: transition to `in_progress`, move the
    /// base set to the current-period key, and persist the cycle's due
    /// instant.
    ///
    /// If the base set is absent the stale current set is deleted instead so
    /// the period starts empty; its final ranks are already in history.
    pub async fn start_new_period(&mut self, now: DateTime<Utc>) -> Result<(), LeaderboardError> {
        let meta = meta_key(&self.config.name);

        // Due instant first: a failure here leaves the old status in place,
        // and an `in_progress` status never coexists with an absent or stale
        // due instant.
        let due = self.next_settlement_time(now);
        self.store
            .hash_set(&meta, META_SETTLES_AT, &due.to_rfc3339_opts(SecondsFormat::Secs, true))
            .await?;

        let swapped = self
            .store
            .compare_and_swap(
                &meta,
                META_STATUS,
                self.status.as_str(),
                Status::InProgress.as_str(),
            )
            .await?;
        if !swapped {
            return Err(LeaderboardError::InvalidState(
                "cannot start new period: status changed concurrently".to_string(),
            ));
        }
        self.status = Status::InProgress;
        self.settles_at = Some(due);

        match self
            .store
            .rename(&self.config.name, &current_key(&self.config.name))
            .await
        {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => {
                self.store.delete(&current_key(&self.config.name)).await?;
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            leaderboard = %self.config.name,
            settles_at = %due,
            "new scoring period started"
        );
        Ok(())
    }

    /// Finalize the in-progress cycle: snapshot every ranked participant
    /// into history and transition to `settled`.
    pub async fn settle(&mut self, now: DateTime<Utc>) -> Result<SettlementRecord, LeaderboardError> {
        self.settle_inner(now, "cannot settle leaderboard that is not in progress")
            .await
    }

    /// Settlement via explicit external trigger; identical semantics to
    /// [`settle`](Self::settle) with its own rejection message.
    pub async fn manual_settlement(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<SettlementRecord, LeaderboardError> {
        self.settle_inner(now, "cannot manually settle leaderboard that is not in progress")
            .await
    }

    async fn settle_inner(
        &mut self,
        now: DateTime<Utc>,
        reject: &str,
    ) -> Result<SettlementRecord, LeaderboardError> {
        if self.status != Status::InProgress {
            return Err(LeaderboardError::InvalidState(reject.to_string()));
        }

        // Full-cardinality snapshot: settlement captures every participant.
        let count = self.view.user_count().await?;
        let snapshot = self.view.top_n(count).await?;

        // The CAS decides the race; a concurrent settle of the same period
        // loses here and writes no history.
        let meta = meta_key(&self.config.name);
        let swapped = self
            .store
            .compare_and_swap(
                &meta,
                META_STATUS,
                Status::InProgress.as_str(),
                Status::Settled.as_str(),
            )
            .await?;
        if !swapped {
            return Err(LeaderboardError::InvalidState(reject.to_string()));
        }
        self.status = Status::Settled;

        let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        let encoded = serde_json::to_string(&snapshot)
            .map_err(|e| LeaderboardError::CorruptHistory(e.to_string()))?;

        if let Err(e) = self
            .store
            .hash_set(&history_key(&self.config.name), &timestamp, &encoded)
            .await
        {
            // Roll the status back so the next tick retries; never leave a
            // settled status without its history record.
            match self
                .store
                .compare_and_swap(
                    &meta,
                    META_STATUS,
                    Status::Settled.as_str(),
                    Status::InProgress.as_str(),
                )
                .await
            {
                Ok(true) => {}
                Ok(false) => warn!(
                    leaderboard = %self.config.name,
                    "settle rollback lost its compare-and-swap, status changed concurrently"
                ),
                Err(rollback) => warn!(
                    leaderboard = %self.config.name,
                    error = %rollback,
                    "settle rollback failed, durable status stranded as settled"
                ),
            }
            self.status = Status::InProgress;
            return Err(e.into());
        }

        info!(
            leaderboard = %self.config.name,
            timestamp = %timestamp,
            participants = snapshot.len(),
            "leaderboard settled"
        );
        Ok(SettlementRecord {
            timestamp,
            snapshot,
        })
    }

    /// All persisted settlement records, timestamp → snapshot, in
    /// chronological order.
    pub async fn history(
        &self,
    ) -> Result<BTreeMap<String, Vec<RankedEntry>>, LeaderboardError> {
        let raw = self
            .store
            .hash_get_all(&history_key(&self.config.name))
            .await?;
        let mut records = BTreeMap::new();
        for (timestamp, encoded) in raw {
            let snapshot: Vec<RankedEntry> = serde_json::from_str(&encoded).map_err(|e| {
                LeaderboardError::CorruptHistory(format!("record at {}: {}", timestamp, e))
            })?;
            records.insert(timestamp, snapshot);
        }
        debug!(leaderboard = %self.config.name, records = records.len(), "history loaded");
        Ok(records)
    }
}
