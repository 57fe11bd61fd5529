//! Background settlement loop.
//!
//! A single recurring task drives all settlement evaluation: once per tick it
//! loads every registry entry, reconstructs the scheduled leaderboard, and
//! settles the ones whose cycle has elapsed. Evaluation is sequential and
//! per-leaderboard failures are logged, never propagated to siblings. Ticks
//! never overlap; a slow tick causes the next one to be skipped, not queued.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use rankd_core::types::{LeaderboardConfig, Status};
use rankd_leaderboard::{LeaderboardError, ScheduledLeaderboard};
use rankd_store::Store;

use crate::state::AppState;

/// What one scheduler pass did with one leaderboard.
#[derive(Debug, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// A fresh scoring period was opened (`pending`/`settled` boards).
    PeriodStarted,
    /// The elapsed cycle was settled and the next period opened.
    Settled,
    /// In progress but the cycle has not elapsed, or a concurrent caller
    /// already applied the transition.
    NotDue,
    /// Terminal status; nothing to do.
    Skipped,
}

/// Evaluate a single leaderboard at `now`.
///
/// A lost compare-and-swap surfaces from the lifecycle layer as
/// `InvalidState`; the scheduler treats that as "not due" and retries on the
/// next tick.
pub async fn evaluate_one(
    store: Arc<dyn Store>,
    config: &LeaderboardConfig,
    now: DateTime<Utc>,
) -> Result<SettlementOutcome, LeaderboardError> {
    let mut board = ScheduledLeaderboard::load(store, config.clone()).await?;

    match board.status() {
        Status::Pending | Status::Settled => match board.start_new_period(now).await {
            Ok(()) => Ok(SettlementOutcome::PeriodStarted),
            Err(LeaderboardError::InvalidState(_)) => Ok(SettlementOutcome::NotDue),
            Err(e) => Err(e),
        },
        Status::InProgress => {
            if board.settles_at().is_none() {
                // An interrupted period start can leave a durable
                // `in_progress` status with no recorded due instant; restore
                // it so the board keeps settling instead of wedging.
                let due = board.restore_due_instant(now).await?;
                warn!(
                    leaderboard = %board.name(),
                    settles_at = %due,
                    "restored missing due instant for in-progress leaderboard"
                );
                return Ok(SettlementOutcome::NotDue);
            }
            if !board.is_due(now) {
                return Ok(SettlementOutcome::NotDue);
            }
            match board.settle(now).await {
                Ok(_) => {
                    board.start_new_period(now).await?;
                    Ok(SettlementOutcome::Settled)
                }
                Err(LeaderboardError::InvalidState(_)) => Ok(SettlementOutcome::NotDue),
                Err(e) => Err(e),
            }
        }
        Status::Expired => Ok(SettlementOutcome::Skipped),
    }
}

/// One scheduler pass over every registered leaderboard.
pub async fn run_tick(state: &AppState, now: DateTime<Utc>) {
    let entries = match state.registry.list_all().await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "settlement tick: failed to load registry");
            return;
        }
    };
    if entries.is_empty() {
        debug!("settlement tick: no scheduled leaderboards");
        return;
    }

    let mut settled = 0usize;
    for (name, config) in entries {
        match evaluate_one(state.store.clone(), &config, now).await {
            Ok(SettlementOutcome::Settled) => settled += 1,
            Ok(_) => {}
            Err(e) => {
                warn!(leaderboard = %name, error = %e, "settlement evaluation failed");
            }
        }
    }

    if settled > 0 {
        info!(settled, "settlement tick complete");
    } else {
        debug!("settlement tick complete, nothing due");
    }
}

/// Main settlement loop. Spawned as a tokio task at startup.
///
/// The `shutdown` channel is a hard stop: the in-flight tick finishes and no
/// further ticks are scheduled.
pub async fn run_settlement_loop(state: Arc<AppState>, mut shutdown: watch::Receiver<bool>) {
    let tick = std::time::Duration::from_secs(state.config.scheduler.tick_interval_secs);
    info!(
        "Settlement scheduler started, evaluating every {}s",
        tick.as_secs()
    );

    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                run_tick(&state, Utc::now()).await;
            }
            result = shutdown.changed() => {
                if result.is_err() || *shutdown.borrow() {
                    info!("Settlement scheduler stopped");
                    break;
                }
            }
        }
    }
}
