//! Snapshot refresh pipeline
//!
//! Change notices from the store trigger a full re-fetch, the pure ranker
//! turns the snapshot into a leaderboard, and the newest result is published
//! to observers.

pub mod refresher;
pub mod snapshot;

pub use refresher::{RefreshOutcome, StandingsRefresher, DEFAULT_TOP_PLAYERS_LIMIT};
pub use snapshot::{Leaderboard, LeaderboardState, StoreSnapshot};
