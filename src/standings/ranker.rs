//! Ranking of team score records and player kill records
//!
//! All functions here are pure: they take ownership of a snapshot, reorder
//! it, and hand it back. Ties that survive every key keep their input order,
//! since `sort_by` is stable.

use crate::error::{Result, StandingsError};
use crate::types::{MatchMode, PlayerStanding, PlayerStatRecord, ScoreRecord, TeamStanding};
use std::cmp::Ordering;
use tracing::trace;

/// Ranking keys of a team's aggregate standing
pub trait TeamTotals {
    fn booyah_count(&self) -> u32;
    fn total_standing_points(&self) -> u32;
    fn total_points(&self) -> u32;
}

/// Ranking key of a player stat row
pub trait KillCount {
    fn kills(&self) -> u32;
}

impl TeamTotals for ScoreRecord {
    fn booyah_count(&self) -> u32 {
        self.booyah_count
    }

    fn total_standing_points(&self) -> u32 {
        self.total_standing_points
    }

    fn total_points(&self) -> u32 {
        self.total_points
    }
}

impl TeamTotals for TeamStanding {
    fn booyah_count(&self) -> u32 {
        self.record.booyah_count
    }

    fn total_standing_points(&self) -> u32 {
        self.record.total_standing_points
    }

    fn total_points(&self) -> u32 {
        self.record.total_points
    }
}

impl KillCount for PlayerStatRecord {
    fn kills(&self) -> u32 {
        self.kills
    }
}

impl KillCount for PlayerStanding {
    fn kills(&self) -> u32 {
        self.record.kills
    }
}

/// Battle Royale order: booyahs, then standing points, then total points,
/// all descending
pub fn compare_battle_royale<T: TeamTotals>(a: &T, b: &T) -> Ordering {
    b.booyah_count()
        .cmp(&a.booyah_count())
        .then_with(|| b.total_standing_points().cmp(&a.total_standing_points()))
        .then_with(|| b.total_points().cmp(&a.total_points()))
}

/// Clash Squad order: total points descending
pub fn compare_clash_squad<T: TeamTotals>(a: &T, b: &T) -> Ordering {
    b.total_points().cmp(&a.total_points())
}

/// Rank Battle Royale teams
///
/// Output has the same length as the input. Records equal on all three keys
/// keep their relative input order.
pub fn rank_battle_royale_teams<T: TeamTotals>(mut records: Vec<T>) -> Vec<T> {
    trace!("Ranking {} Battle Royale records", records.len());
    records.sort_by(compare_battle_royale);
    records
}

/// Rank Clash Squad teams by total points, ties in input order
pub fn rank_clash_squad_teams<T: TeamTotals>(mut records: Vec<T>) -> Vec<T> {
    trace!("Ranking {} Clash Squad records", records.len());
    records.sort_by(compare_clash_squad);
    records
}

/// Rank teams with the rules of the given mode
pub fn rank_teams<T: TeamTotals>(mode: MatchMode, records: Vec<T>) -> Vec<T> {
    match mode {
        MatchMode::BattleRoyale => rank_battle_royale_teams(records),
        MatchMode::ClashSquad => rank_clash_squad_teams(records),
    }
}

/// Top `limit` players by kills, descending, ties in input order
///
/// A `limit` of zero is rejected with [`StandingsError::InvalidLimit`].
pub fn top_players_by_kills<T: KillCount>(mut records: Vec<T>, limit: usize) -> Result<Vec<T>> {
    if limit == 0 {
        return Err(StandingsError::InvalidLimit { limit }.into());
    }

    records.sort_by(|a, b| b.kills().cmp(&a.kills()));
    records.truncate(limit);
    Ok(records)
}
