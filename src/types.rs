//! Common types used throughout the standings service

use crate::error::StandingsError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for registered teams
pub type TeamId = Uuid;

/// Unique identifier for player profiles
pub type PlayerId = Uuid;

/// Tournament mode a score or stat belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchMode {
    #[serde(rename = "BR")]
    BattleRoyale,
    #[serde(rename = "CS")]
    ClashSquad,
}

impl MatchMode {
    /// All modes, in display order
    pub const ALL: [MatchMode; 2] = [MatchMode::BattleRoyale, MatchMode::ClashSquad];

    /// Backend table holding team score rows for this mode
    pub fn score_table(&self) -> &'static str {
        match self {
            MatchMode::BattleRoyale => "match_scores_br",
            MatchMode::ClashSquad => "match_scores_cs",
        }
    }

    /// Backend table holding per-player stat rows for this mode
    pub fn player_table(&self) -> &'static str {
        match self {
            MatchMode::BattleRoyale => "player_stats_br",
            MatchMode::ClashSquad => "player_stats_cs",
        }
    }

    /// Column numbering matches (BR) or rounds (CS) in backend tables
    pub fn match_column(&self) -> &'static str {
        match self {
            MatchMode::BattleRoyale => "match_number",
            MatchMode::ClashSquad => "round_number",
        }
    }

    /// Short lowercase slug used in URLs and metric labels
    pub fn slug(&self) -> &'static str {
        match self {
            MatchMode::BattleRoyale => "br",
            MatchMode::ClashSquad => "cs",
        }
    }
}

impl std::fmt::Display for MatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMode::BattleRoyale => write!(f, "Battle Royale"),
            MatchMode::ClashSquad => write!(f, "Clash Squad"),
        }
    }
}

impl FromStr for MatchMode {
    type Err = StandingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "br" | "battle-royale" | "battle_royale" => Ok(MatchMode::BattleRoyale),
            "cs" | "clash-squad" | "clash_squad" => Ok(MatchMode::ClashSquad),
            _ => Err(StandingsError::UnknownMode {
                value: s.to_string(),
            }),
        }
    }
}

/// Role a member plays inside a registered team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppRole {
    Rusher,
    Flanker,
    Bomber,
    Supporter,
}

/// Display identity of a team, joined onto score rows for presentation only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    pub team_id: TeamId,
    pub team_name: String,
    /// Public short code, e.g. `BPUT-T-0042`
    pub unique_team_id: String,
    pub team_logo_url: Option<String>,
}

/// Display identity of a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub player_id: PlayerId,
    pub in_game_name: String,
    /// Public short code, e.g. `BPUT-FF-0007`
    pub unique_player_id: String,
    pub full_name: Option<String>,
}

/// Validated team score row for one (team, match) pair in Battle Royale
/// or one (team, round) pair in Clash Squad
///
/// The `total_*` fields are the store's cumulative aggregate as of this row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub team_id: TeamId,
    pub mode: MatchMode,
    /// Match number (Battle Royale) or round number (Clash Squad)
    pub match_number: u32,
    pub match_kills: u32,
    pub match_standing_points: u32,
    pub total_kills: u32,
    pub total_standing_points: u32,
    /// First-place finishes; always 0 in Clash Squad
    pub booyah_count: u32,
    pub total_points: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ScoreRecord {
    /// Record with every count at zero, before any match is applied
    pub fn empty(team_id: TeamId, mode: MatchMode) -> Self {
        Self {
            team_id,
            mode,
            match_number: 0,
            match_kills: 0,
            match_standing_points: 0,
            total_kills: 0,
            total_standing_points: 0,
            booyah_count: 0,
            total_points: 0,
            updated_at: None,
        }
    }
}

/// Validated per-player stat row for one (player, match-or-round) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatRecord {
    pub player_id: PlayerId,
    pub team_id: TeamId,
    pub mode: MatchMode,
    pub match_number: u32,
    pub kills: u32,
    /// Clash Squad only
    pub deaths: Option<u32>,
    /// Clash Squad only
    pub assists: Option<u32>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A team score record joined with its display identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStanding {
    #[serde(flatten)]
    pub record: ScoreRecord,
    pub team: Option<TeamRef>,
}

/// A player stat record joined with its display identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStanding {
    #[serde(flatten)]
    pub record: PlayerStatRecord,
    pub player: Option<PlayerRef>,
    pub team_name: Option<String>,
}

/// Table that changed in the score store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreTable {
    TeamScores(MatchMode),
    PlayerStats(MatchMode),
    Teams,
}

impl StoreTable {
    /// Backend table name
    pub fn name(&self) -> &'static str {
        match self {
            StoreTable::TeamScores(mode) => mode.score_table(),
            StoreTable::PlayerStats(mode) => mode.player_table(),
            StoreTable::Teams => "teams",
        }
    }
}

/// Opaque "rows changed" signal from the score store
///
/// Carries no row-level delta; receivers re-fetch the full snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotice {
    pub table: StoreTable,
    pub timestamp: DateTime<Utc>,
}
