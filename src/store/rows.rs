//! Raw rows as returned by the hosted score backend
//!
//! Numeric columns are nullable signed integers on the wire. A `NULL` counts
//! as zero; a negative value is rejected rather than coerced.

use crate::error::StandingsError;
use crate::types::{
    MatchMode, PlayerId, PlayerRef, PlayerStanding, PlayerStatRecord, ScoreRecord, TeamId,
    TeamRef, TeamStanding,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Team columns embedded via `teams:team_id(...)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamEmbed {
    pub team_name: String,
    #[serde(default)]
    pub unique_team_id: Option<String>,
    #[serde(default)]
    pub team_logo_url: Option<String>,
}

/// Profile columns embedded via `profiles:user_id(...)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEmbed {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub unique_player_id: Option<String>,
    #[serde(default)]
    pub in_game_name: Option<String>,
}

/// Row of `match_scores_br`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrScoreRow {
    pub match_id: Uuid,
    pub team_id: TeamId,
    pub match_number: i64,
    pub booyah: Option<i64>,
    pub match_kills: Option<i64>,
    pub match_standing_points: Option<i64>,
    pub total_kills: Option<i64>,
    pub total_standing_points: Option<i64>,
    pub total_points: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub teams: Option<TeamEmbed>,
}

/// Row of `match_scores_cs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsScoreRow {
    pub match_id: Uuid,
    pub team_id: TeamId,
    pub round_number: i64,
    pub match_kills: Option<i64>,
    pub match_standing_points: Option<i64>,
    pub total_kills: Option<i64>,
    pub total_standing_points: Option<i64>,
    pub total_points: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub teams: Option<TeamEmbed>,
}

/// Row of `player_stats_br`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrPlayerStatRow {
    pub id: Uuid,
    pub user_id: PlayerId,
    pub team_id: TeamId,
    pub match_number: i64,
    pub kills: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub profiles: Option<ProfileEmbed>,
    #[serde(default)]
    pub teams: Option<TeamEmbed>,
}

/// Row of `player_stats_cs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsPlayerStatRow {
    pub id: Uuid,
    pub user_id: PlayerId,
    pub team_id: TeamId,
    pub round_number: i64,
    pub kills: Option<i64>,
    pub deaths: Option<i64>,
    pub assists: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub profiles: Option<ProfileEmbed>,
    #[serde(default)]
    pub teams: Option<TeamEmbed>,
}

/// Convert a nullable column to a count, treating `NULL` as zero
fn count(table: &'static str, field: &'static str, value: Option<i64>) -> Result<u32, StandingsError> {
    match value {
        None => Ok(0),
        Some(v) => non_negative(table, field, v),
    }
}

/// Convert a nullable column that stays optional (deaths, assists)
fn optional_count(
    table: &'static str,
    field: &'static str,
    value: Option<i64>,
) -> Result<Option<u32>, StandingsError> {
    value.map(|v| non_negative(table, field, v)).transpose()
}

fn non_negative(table: &'static str, field: &'static str, value: i64) -> Result<u32, StandingsError> {
    if value < 0 {
        return Err(StandingsError::NegativeField {
            table,
            field,
            value,
        });
    }
    u32::try_from(value).map_err(|_| StandingsError::FieldOutOfRange {
        table,
        field,
        value,
    })
}

fn team_ref(team_id: TeamId, embed: Option<TeamEmbed>) -> Option<TeamRef> {
    embed.map(|team| TeamRef {
        team_id,
        team_name: team.team_name,
        unique_team_id: team.unique_team_id.unwrap_or_default(),
        team_logo_url: team.team_logo_url,
    })
}

fn player_ref(player_id: PlayerId, embed: Option<ProfileEmbed>) -> Option<PlayerRef> {
    embed.map(|profile| PlayerRef {
        player_id,
        in_game_name: profile.in_game_name.unwrap_or_default(),
        unique_player_id: profile.unique_player_id.unwrap_or_default(),
        full_name: profile.full_name,
    })
}

impl TryFrom<BrScoreRow> for TeamStanding {
    type Error = StandingsError;

    fn try_from(row: BrScoreRow) -> Result<Self, Self::Error> {
        const TABLE: &str = "match_scores_br";
        let record = ScoreRecord {
            team_id: row.team_id,
            mode: MatchMode::BattleRoyale,
            match_number: non_negative(TABLE, "match_number", row.match_number)?,
            match_kills: count(TABLE, "match_kills", row.match_kills)?,
            match_standing_points: count(TABLE, "match_standing_points", row.match_standing_points)?,
            total_kills: count(TABLE, "total_kills", row.total_kills)?,
            total_standing_points: count(TABLE, "total_standing_points", row.total_standing_points)?,
            booyah_count: count(TABLE, "booyah", row.booyah)?,
            total_points: count(TABLE, "total_points", row.total_points)?,
            updated_at: row.updated_at,
        };

        Ok(TeamStanding {
            team: team_ref(row.team_id, row.teams),
            record,
        })
    }
}

impl TryFrom<CsScoreRow> for TeamStanding {
    type Error = StandingsError;

    fn try_from(row: CsScoreRow) -> Result<Self, Self::Error> {
        const TABLE: &str = "match_scores_cs";
        let record = ScoreRecord {
            team_id: row.team_id,
            mode: MatchMode::ClashSquad,
            match_number: non_negative(TABLE, "round_number", row.round_number)?,
            match_kills: count(TABLE, "match_kills", row.match_kills)?,
            match_standing_points: count(TABLE, "match_standing_points", row.match_standing_points)?,
            total_kills: count(TABLE, "total_kills", row.total_kills)?,
            total_standing_points: count(TABLE, "total_standing_points", row.total_standing_points)?,
            booyah_count: 0,
            total_points: count(TABLE, "total_points", row.total_points)?,
            updated_at: row.updated_at,
        };

        Ok(TeamStanding {
            team: team_ref(row.team_id, row.teams),
            record,
        })
    }
}

impl TryFrom<BrPlayerStatRow> for PlayerStanding {
    type Error = StandingsError;

    fn try_from(row: BrPlayerStatRow) -> Result<Self, Self::Error> {
        const TABLE: &str = "player_stats_br";
        let record = PlayerStatRecord {
            player_id: row.user_id,
            team_id: row.team_id,
            mode: MatchMode::BattleRoyale,
            match_number: non_negative(TABLE, "match_number", row.match_number)?,
            kills: count(TABLE, "kills", row.kills)?,
            deaths: None,
            assists: None,
            updated_at: row.updated_at,
        };

        Ok(PlayerStanding {
            player: player_ref(row.user_id, row.profiles),
            team_name: row.teams.map(|team| team.team_name),
            record,
        })
    }
}

impl TryFrom<CsPlayerStatRow> for PlayerStanding {
    type Error = StandingsError;

    fn try_from(row: CsPlayerStatRow) -> Result<Self, Self::Error> {
        const TABLE: &str = "player_stats_cs";
        let record = PlayerStatRecord {
            player_id: row.user_id,
            team_id: row.team_id,
            mode: MatchMode::ClashSquad,
            match_number: non_negative(TABLE, "round_number", row.round_number)?,
            kills: count(TABLE, "kills", row.kills)?,
            deaths: optional_count(TABLE, "deaths", row.deaths)?,
            assists: optional_count(TABLE, "assists", row.assists)?,
            updated_at: row.updated_at,
        };

        Ok(PlayerStanding {
            player: player_ref(row.user_id, row.profiles),
            team_name: row.teams.map(|team| team.team_name),
            record,
        })
    }
}

/// Decode a JSON array of team score rows for the given mode
pub fn decode_team_scores(mode: MatchMode, body: &[u8]) -> crate::error::Result<Vec<TeamStanding>> {
    let standings = match mode {
        MatchMode::BattleRoyale => convert_all::<BrScoreRow, TeamStanding>(body)?,
        MatchMode::ClashSquad => convert_all::<CsScoreRow, TeamStanding>(body)?,
    };
    Ok(standings)
}

/// Decode a JSON array of player stat rows for the given mode
pub fn decode_player_stats(
    mode: MatchMode,
    body: &[u8],
) -> crate::error::Result<Vec<PlayerStanding>> {
    let stats = match mode {
        MatchMode::BattleRoyale => convert_all::<BrPlayerStatRow, PlayerStanding>(body)?,
        MatchMode::ClashSquad => convert_all::<CsPlayerStatRow, PlayerStanding>(body)?,
    };
    Ok(stats)
}

fn convert_all<R, T>(body: &[u8]) -> crate::error::Result<Vec<T>>
where
    R: serde::de::DeserializeOwned,
    T: TryFrom<R, Error = StandingsError>,
{
    let rows: Vec<R> =
        serde_json::from_slice(body).map_err(|e| StandingsError::MalformedResponse {
            message: e.to_string(),
        })?;

    let converted = rows
        .into_iter()
        .map(T::try_from)
        .collect::<Result<Vec<T>, StandingsError>>()?;
    Ok(converted)
}
