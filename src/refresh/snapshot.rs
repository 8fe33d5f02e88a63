//! Full store snapshots and the ranked leaderboard derived from them

use crate::error::Result;
use crate::standings::{
    latest_per_team, rank_battle_royale_teams, rank_clash_squad_teams, top_players_by_kills,
    with_positions, KillCount, Ranked, TeamTotals,
};
use crate::store::ScoreStore;
use crate::types::{MatchMode, PlayerStanding, TeamStanding};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything read from the store for one refresh
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub br_scores: Vec<TeamStanding>,
    pub cs_scores: Vec<TeamStanding>,
    pub br_players: Vec<PlayerStanding>,
    pub cs_players: Vec<PlayerStanding>,
}

impl StoreSnapshot {
    /// Read the four tables concurrently. Player stats are pre-limited by
    /// the store.
    pub async fn fetch(store: &dyn ScoreStore, top_players_limit: usize) -> Result<Self> {
        let (br_scores, cs_scores, br_players, cs_players) = tokio::try_join!(
            store.fetch_team_scores(MatchMode::BattleRoyale),
            store.fetch_team_scores(MatchMode::ClashSquad),
            store.fetch_player_stats(MatchMode::BattleRoyale, Some(top_players_limit)),
            store.fetch_player_stats(MatchMode::ClashSquad, Some(top_players_limit)),
        )?;

        Ok(Self {
            br_scores,
            cs_scores,
            br_players,
            cs_players,
        })
    }
}

/// Ranked view of one snapshot, ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub generation: u64,
    pub refreshed_at: DateTime<Utc>,
    pub br_teams: Vec<Ranked<TeamStanding>>,
    pub cs_teams: Vec<Ranked<TeamStanding>>,
    pub br_players: Vec<Ranked<PlayerStanding>>,
    pub cs_players: Vec<Ranked<PlayerStanding>>,
}

impl Leaderboard {
    /// A leaderboard with no entries
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            refreshed_at: current_timestamp(),
            br_teams: Vec::new(),
            cs_teams: Vec::new(),
            br_players: Vec::new(),
            cs_players: Vec::new(),
        }
    }

    /// Rank a snapshot. Score rows are reduced to the latest row per team
    /// before ranking.
    pub fn build(snapshot: StoreSnapshot, generation: u64, top_players_limit: usize) -> Result<Self> {
        let br_teams = rank_battle_royale_teams(latest_per_team(snapshot.br_scores));
        let cs_teams = rank_clash_squad_teams(latest_per_team(snapshot.cs_scores));
        let br_players = top_players_by_kills(snapshot.br_players, top_players_limit)?;
        let cs_players = top_players_by_kills(snapshot.cs_players, top_players_limit)?;

        Ok(Self {
            generation,
            refreshed_at: current_timestamp(),
            br_teams: with_positions(br_teams),
            cs_teams: with_positions(cs_teams),
            br_players: with_positions(br_players),
            cs_players: with_positions(cs_players),
        })
    }

    /// Team standings of a mode
    pub fn teams(&self, mode: MatchMode) -> &[Ranked<TeamStanding>] {
        match mode {
            MatchMode::BattleRoyale => &self.br_teams,
            MatchMode::ClashSquad => &self.cs_teams,
        }
    }

    /// Top players of a mode
    pub fn players(&self, mode: MatchMode) -> &[Ranked<PlayerStanding>] {
        match mode {
            MatchMode::BattleRoyale => &self.br_players,
            MatchMode::ClashSquad => &self.cs_players,
        }
    }
}

impl<T: TeamTotals> TeamTotals for Ranked<T> {
    fn booyah_count(&self) -> u32 {
        self.entry.booyah_count()
    }

    fn total_standing_points(&self) -> u32 {
        self.entry.total_standing_points()
    }

    fn total_points(&self) -> u32 {
        self.entry.total_points()
    }
}

impl<T: KillCount> KillCount for Ranked<T> {
    fn kills(&self) -> u32 {
        self.entry.kills()
    }
}

/// What observers of the refresher currently see
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LeaderboardState {
    /// No refresh has completed yet
    Loading,
    Ready {
        leaderboard: Leaderboard,
    },
    /// The latest refresh failed; the last good leaderboard is kept
    Failed {
        generation: u64,
        message: String,
        last_good: Option<Leaderboard>,
    },
}

impl LeaderboardState {
    /// Generation of the refresh this state came from
    pub fn generation(&self) -> u64 {
        match self {
            LeaderboardState::Loading => 0,
            LeaderboardState::Ready { leaderboard } => leaderboard.generation,
            LeaderboardState::Failed { generation, .. } => *generation,
        }
    }

    /// Leaderboard to display, if any
    pub fn leaderboard(&self) -> Option<&Leaderboard> {
        match self {
            LeaderboardState::Loading => None,
            LeaderboardState::Ready { leaderboard } => Some(leaderboard),
            LeaderboardState::Failed { last_good, .. } => last_good.as_ref(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, LeaderboardState::Ready { .. })
    }
}
