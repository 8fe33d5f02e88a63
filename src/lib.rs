//! Points Table - tournament standings service
//!
//! This crate ranks Battle Royale and Clash Squad teams and top fraggers
//! from an external score store, keeps the ranked leaderboard in sync with
//! store changes, and serves it over HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod refresh;
pub mod registration;
pub mod service;
pub mod standings;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Result, StandingsError};
pub use types::*;

// Re-export key components
pub use refresh::{Leaderboard, LeaderboardState, StandingsRefresher};
pub use standings::{
    rank_battle_royale_teams, rank_clash_squad_teams, top_players_by_kills, RankBadge,
};
pub use store::{InMemoryScoreStore, ScoreStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
