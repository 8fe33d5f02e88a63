//! Standings computation for team and player leaderboards
//!
//! This module provides the pure ranking functions, reduction of per-match
//! score rows to one aggregate row per team, and rank badge classification.

pub mod aggregate;
pub mod badge;
pub mod ranker;

// Re-export commonly used types
pub use aggregate::{latest_per_team, AggregateRow};
pub use badge::{with_positions, RankBadge, Ranked};
pub use ranker::{
    compare_battle_royale, compare_clash_squad, rank_battle_royale_teams, rank_clash_squad_teams,
    rank_teams, top_players_by_kills, KillCount, TeamTotals,
};
