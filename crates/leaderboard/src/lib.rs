//! Leaderboard domain logic.
//!
//! [`Leaderboard`] is a stateless ranked view over one ordered set.
//! [`ScheduledLeaderboard`] composes a view with durable lifecycle state to
//! implement recurring settlement: period rollover, due-time computation,
//! status-gated writes, and append-only settlement history.

pub mod error;
pub mod schedule;
pub mod scheduled;
pub mod view;

pub use error::LeaderboardError;
pub use schedule::next_settlement_time;
pub use scheduled::ScheduledLeaderboard;
pub use view::Leaderboard;
