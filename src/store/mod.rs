//! Score store interface and implementations
//!
//! The score store is the external backend that owns team score rows and
//! player stats. This module defines the read + subscribe contract the
//! standings service relies on, an in-memory implementation, and an adapter
//! for the hosted REST backend.

pub mod memory;
pub mod rest;
pub mod rows;
pub mod subscription;

use crate::error::Result;
use crate::types::{MatchMode, PlayerId, PlayerStanding, TeamStanding};
use async_trait::async_trait;

// Re-export commonly used types
pub use memory::{InMemoryScoreStore, MatchResult, SeedData};
pub use rest::{RestScoreStore, RestStoreConfig};
pub use subscription::{ChangeFeed, ChangeSubscription};

/// Trait for score store read operations and change notifications
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// All current team score rows for a mode, joined with team identity.
    /// May contain one row per (team, match).
    async fn fetch_team_scores(&self, mode: MatchMode) -> Result<Vec<TeamStanding>>;

    /// Player stat rows for a mode. With a limit, only the rows with the
    /// most kills are returned.
    async fn fetch_player_stats(
        &self,
        mode: MatchMode,
        limit: Option<usize>,
    ) -> Result<Vec<PlayerStanding>>;

    /// Every stat row of one player in a mode, in match order
    async fn fetch_player_history(
        &self,
        mode: MatchMode,
        player_id: PlayerId,
    ) -> Result<Vec<PlayerStanding>>;

    /// Subscribe to "rows changed" signals
    fn subscribe(&self) -> ChangeSubscription;
}
