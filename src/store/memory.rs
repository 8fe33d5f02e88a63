//! In-memory score store
//!
//! Keeps one row per (team, match) like the hosted backend does and
//! maintains the cumulative columns itself: every upsert recomputes the
//! running totals of the affected team in match order.

use crate::error::{Result, StandingsError};
use crate::standings::top_players_by_kills;
use crate::store::subscription::{ChangeFeed, ChangeSubscription};
use crate::store::ScoreStore;
use crate::types::{
    MatchMode, PlayerId, PlayerRef, PlayerStanding, PlayerStatRecord, ScoreRecord, StoreTable,
    TeamId, TeamRef, TeamStanding,
};
use crate::utils::current_timestamp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info};

/// Result of one team in one match (or round), as entered by an admin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub team_id: TeamId,
    pub match_number: u32,
    pub kills: u32,
    pub standing_points: u32,
    /// First place finish; ignored in Clash Squad
    #[serde(default)]
    pub booyah: bool,
}

/// Seed file contents for a local in-memory store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub teams: Vec<TeamRef>,
    pub players: Vec<PlayerRef>,
    pub br_results: Vec<MatchResult>,
    pub cs_results: Vec<MatchResult>,
    pub player_stats: Vec<PlayerStatRecord>,
}

#[derive(Debug, Clone)]
struct ScoreRow {
    record: ScoreRecord,
    booyah: bool,
}

/// In-memory score store implementation
#[derive(Debug)]
pub struct InMemoryScoreStore {
    teams: RwLock<HashMap<TeamId, TeamRef>>,
    players: RwLock<HashMap<PlayerId, PlayerRef>>,
    scores: RwLock<Vec<ScoreRow>>,
    player_stats: RwLock<Vec<PlayerStatRecord>>,
    feed: ChangeFeed,
}

fn lock_error(what: &str) -> StandingsError {
    StandingsError::InternalError {
        message: format!("Failed to acquire {} lock", what),
    }
}

impl InMemoryScoreStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            teams: RwLock::new(HashMap::new()),
            players: RwLock::new(HashMap::new()),
            scores: RwLock::new(Vec::new()),
            player_stats: RwLock::new(Vec::new()),
            feed: ChangeFeed::default(),
        }
    }

    /// Create a store populated from seed data
    pub fn from_seed(seed: SeedData) -> Result<Self> {
        let store = Self::new();
        for team in seed.teams {
            store.register_team(team)?;
        }
        for player in seed.players {
            store.register_player(player)?;
        }
        for result in seed.br_results {
            store.upsert_match_result(MatchMode::BattleRoyale, result)?;
        }
        for result in seed.cs_results {
            store.upsert_match_result(MatchMode::ClashSquad, result)?;
        }
        for stat in seed.player_stats {
            store.record_player_stat(stat)?;
        }
        Ok(store)
    }

    /// Load seed data from a JSON file
    pub fn from_seed_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            StandingsError::ConfigurationError {
                message: format!("Failed to read seed file {}: {}", path.display(), e),
            }
        })?;
        let seed: SeedData =
            serde_json::from_str(&contents).map_err(|e| StandingsError::ConfigurationError {
                message: format!("Invalid seed file {}: {}", path.display(), e),
            })?;

        info!(
            "Seeding in-memory store from {} ({} teams, {} players)",
            path.display(),
            seed.teams.len(),
            seed.players.len()
        );
        Self::from_seed(seed)
    }

    /// Register or update a team's display identity
    pub fn register_team(&self, team: TeamRef) -> Result<()> {
        let mut teams = self.teams.write().map_err(|_| lock_error("teams write"))?;
        teams.insert(team.team_id, team);
        drop(teams);

        self.feed.publish(StoreTable::Teams);
        Ok(())
    }

    /// Register or update a player's display identity
    pub fn register_player(&self, player: PlayerRef) -> Result<()> {
        let mut players = self
            .players
            .write()
            .map_err(|_| lock_error("players write"))?;
        players.insert(player.player_id, player);
        Ok(())
    }

    /// Insert or replace a team's result for one match and recompute the
    /// team's running totals. Returns the stored row for that match.
    pub fn upsert_match_result(&self, mode: MatchMode, result: MatchResult) -> Result<ScoreRecord> {
        self.ensure_team(result.team_id)?;

        let mut scores = self.scores.write().map_err(|_| lock_error("scores write"))?;

        let booyah = result.booyah && mode == MatchMode::BattleRoyale;
        let position = scores.iter().position(|row| {
            row.record.mode == mode
                && row.record.team_id == result.team_id
                && row.record.match_number == result.match_number
        });

        let mut record = ScoreRecord::empty(result.team_id, mode);
        record.match_number = result.match_number;
        record.match_kills = result.kills;
        record.match_standing_points = result.standing_points;
        record.updated_at = Some(current_timestamp());

        match position {
            Some(idx) => scores[idx] = ScoreRow { record, booyah },
            None => scores.push(ScoreRow { record, booyah }),
        }

        recompute_totals(&mut scores, mode, result.team_id);

        let stored = scores
            .iter()
            .find(|row| {
                row.record.mode == mode
                    && row.record.team_id == result.team_id
                    && row.record.match_number == result.match_number
            })
            .map(|row| row.record.clone())
            .ok_or_else(|| StandingsError::InternalError {
                message: "Upserted score row disappeared".to_string(),
            })?;
        drop(scores);

        debug!(
            "Stored {} result for team {} match {}: total {} points",
            mode, stored.team_id, stored.match_number, stored.total_points
        );
        self.feed.publish(StoreTable::TeamScores(mode));
        Ok(stored)
    }

    /// Insert or replace a player's stat row for one match
    pub fn record_player_stat(&self, stat: PlayerStatRecord) -> Result<()> {
        self.ensure_team(stat.team_id)?;
        let mode = stat.mode;

        let mut stats = self
            .player_stats
            .write()
            .map_err(|_| lock_error("player stats write"))?;

        let position = stats.iter().position(|existing| {
            existing.mode == stat.mode
                && existing.player_id == stat.player_id
                && existing.match_number == stat.match_number
        });

        let mut stat = stat;
        if stat.updated_at.is_none() {
            stat.updated_at = Some(current_timestamp());
        }

        match position {
            Some(idx) => stats[idx] = stat,
            None => stats.push(stat),
        }
        drop(stats);

        self.feed.publish(StoreTable::PlayerStats(mode));
        Ok(())
    }

    /// Number of score rows held for a mode
    pub fn score_row_count(&self, mode: MatchMode) -> Result<usize> {
        let scores = self.scores.read().map_err(|_| lock_error("scores read"))?;
        Ok(scores.iter().filter(|row| row.record.mode == mode).count())
    }

    fn ensure_team(&self, team_id: TeamId) -> Result<()> {
        let teams = self.teams.read().map_err(|_| lock_error("teams read"))?;
        if teams.contains_key(&team_id) {
            Ok(())
        } else {
            Err(StandingsError::UnknownTeam { team_id }.into())
        }
    }
}

/// Recompute cumulative columns for one team in match order
fn recompute_totals(scores: &mut [ScoreRow], mode: MatchMode, team_id: TeamId) {
    let mut indices: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, row)| row.record.mode == mode && row.record.team_id == team_id)
        .map(|(idx, _)| idx)
        .collect();
    indices.sort_by_key(|&idx| scores[idx].record.match_number);

    let mut total_kills = 0u32;
    let mut total_standing_points = 0u32;
    let mut booyah_count = 0u32;

    for idx in indices {
        let row = &mut scores[idx];
        total_kills = total_kills.saturating_add(row.record.match_kills);
        total_standing_points = total_standing_points.saturating_add(row.record.match_standing_points);
        if row.booyah {
            booyah_count += 1;
        }

        row.record.total_kills = total_kills;
        row.record.total_standing_points = total_standing_points;
        row.record.booyah_count = booyah_count;
        row.record.total_points = total_kills.saturating_add(total_standing_points);
    }
}

impl Default for InMemoryScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScoreStore for InMemoryScoreStore {
    async fn fetch_team_scores(&self, mode: MatchMode) -> Result<Vec<TeamStanding>> {
        let teams = self.teams.read().map_err(|_| lock_error("teams read"))?;
        let scores = self.scores.read().map_err(|_| lock_error("scores read"))?;

        Ok(scores
            .iter()
            .filter(|row| row.record.mode == mode)
            .map(|row| TeamStanding {
                record: row.record.clone(),
                team: teams.get(&row.record.team_id).cloned(),
            })
            .collect())
    }

    async fn fetch_player_stats(
        &self,
        mode: MatchMode,
        limit: Option<usize>,
    ) -> Result<Vec<PlayerStanding>> {
        let standings: Vec<PlayerStanding> = {
            let teams = self.teams.read().map_err(|_| lock_error("teams read"))?;
            let players = self.players.read().map_err(|_| lock_error("players read"))?;
            let stats = self
                .player_stats
                .read()
                .map_err(|_| lock_error("player stats read"))?;

            stats
                .iter()
                .filter(|stat| stat.mode == mode)
                .map(|stat| PlayerStanding {
                    record: stat.clone(),
                    player: players.get(&stat.player_id).cloned(),
                    team_name: teams.get(&stat.team_id).map(|team| team.team_name.clone()),
                })
                .collect()
        };

        match limit {
            Some(limit) => top_players_by_kills(standings, limit),
            None => Ok(standings),
        }
    }

    async fn fetch_player_history(
        &self,
        mode: MatchMode,
        player_id: PlayerId,
    ) -> Result<Vec<PlayerStanding>> {
        let teams = self.teams.read().map_err(|_| lock_error("teams read"))?;
        let players = self.players.read().map_err(|_| lock_error("players read"))?;
        let stats = self
            .player_stats
            .read()
            .map_err(|_| lock_error("player stats read"))?;

        let mut history: Vec<PlayerStanding> = stats
            .iter()
            .filter(|stat| stat.mode == mode && stat.player_id == player_id)
            .map(|stat| PlayerStanding {
                record: stat.clone(),
                player: players.get(&stat.player_id).cloned(),
                team_name: teams.get(&stat.team_id).map(|team| team.team_name.clone()),
            })
            .collect();
        history.sort_by_key(|standing| standing.record.match_number);
        Ok(history)
    }

    fn subscribe(&self) -> ChangeSubscription {
        self.feed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;
    use uuid::Uuid;

    fn team(name: &str) -> TeamRef {
        TeamRef {
            team_id: Uuid::new_v4(),
            team_name: name.to_string(),
            unique_team_id: format!("BPUT-T-{}", name),
            team_logo_url: None,
        }
    }

    fn result(team_id: TeamId, match_number: u32, kills: u32, standing_points: u32, booyah: bool) -> MatchResult {
        MatchResult {
            team_id,
            match_number,
            kills,
            standing_points,
            booyah,
        }
    }

    fn stat(player_id: PlayerId, team_id: TeamId, match_number: u32, kills: u32) -> PlayerStatRecord {
        PlayerStatRecord {
            player_id,
            team_id,
            mode: MatchMode::BattleRoyale,
            match_number,
            kills,
            deaths: None,
            assists: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_totals_are_maintained_by_store() {
        let store = InMemoryScoreStore::new();
        let owls = team("owls");
        store.register_team(owls.clone()).unwrap();

        store
            .upsert_match_result(MatchMode::BattleRoyale, result(owls.team_id, 1, 6, 12, true))
            .unwrap();
        let second = store
            .upsert_match_result(MatchMode::BattleRoyale, result(owls.team_id, 2, 3, 4, false))
            .unwrap();

        assert_eq!(second.total_kills, 9);
        assert_eq!(second.total_standing_points, 16);
        assert_eq!(second.total_points, 25);
        assert_eq!(second.booyah_count, 1);
    }

    #[test]
    fn test_out_of_order_upsert_recomputes_later_rows() {
        let store = InMemoryScoreStore::new();
        let owls = team("owls");
        store.register_team(owls.clone()).unwrap();

        store
            .upsert_match_result(MatchMode::BattleRoyale, result(owls.team_id, 2, 3, 4, false))
            .unwrap();
        store
            .upsert_match_result(MatchMode::BattleRoyale, result(owls.team_id, 1, 6, 12, true))
            .unwrap();

        let rows = tokio_test::block_on(store.fetch_team_scores(MatchMode::BattleRoyale)).unwrap();
        let latest = rows
            .iter()
            .find(|row| row.record.match_number == 2)
            .unwrap();
        assert_eq!(latest.record.total_points, 25);
        assert_eq!(latest.record.booyah_count, 1);
    }

    #[test]
    fn test_replacing_a_match_result() {
        let store = InMemoryScoreStore::new();
        let owls = team("owls");
        store.register_team(owls.clone()).unwrap();

        store
            .upsert_match_result(MatchMode::ClashSquad, result(owls.team_id, 1, 5, 5, false))
            .unwrap();
        let corrected = store
            .upsert_match_result(MatchMode::ClashSquad, result(owls.team_id, 1, 7, 5, true))
            .unwrap();

        assert_eq!(corrected.total_points, 12);
        assert_eq!(corrected.booyah_count, 0, "Clash Squad has no booyah");
        assert_eq!(store.score_row_count(MatchMode::ClashSquad).unwrap(), 1);
    }

    #[test]
    fn test_unknown_team_is_rejected() {
        let store = InMemoryScoreStore::new();
        let team_id = Uuid::new_v4();

        let err = store
            .upsert_match_result(MatchMode::BattleRoyale, result(team_id, 1, 1, 1, false))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<StandingsError>(),
            Some(&StandingsError::UnknownTeam { team_id })
        );
    }

    #[tokio::test]
    async fn test_fetch_joins_team_identity() {
        let store = InMemoryScoreStore::new();
        let owls = team("owls");
        store.register_team(owls.clone()).unwrap();
        store
            .upsert_match_result(MatchMode::BattleRoyale, result(owls.team_id, 1, 2, 3, false))
            .unwrap();

        let rows = store.fetch_team_scores(MatchMode::BattleRoyale).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].team.as_ref().unwrap().team_name, "owls");

        assert!(store
            .fetch_team_scores(MatchMode::ClashSquad)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_player_stats_limit() {
        let store = InMemoryScoreStore::new();
        let owls = team("owls");
        store.register_team(owls.clone()).unwrap();

        for kills in [3, 9, 5, 1] {
            store
                .record_player_stat(stat(Uuid::new_v4(), owls.team_id, 1, kills))
                .unwrap();
        }

        let top = store
            .fetch_player_stats(MatchMode::BattleRoyale, Some(2))
            .await
            .unwrap();
        let kills: Vec<u32> = top.iter().map(|p| p.record.kills).collect();
        assert_eq!(kills, vec![9, 5]);
        assert_eq!(top[0].team_name.as_deref(), Some("owls"));

        let all = store
            .fetch_player_stats(MatchMode::BattleRoyale, None)
            .await
            .unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_player_history_is_in_match_order() {
        let store = InMemoryScoreStore::new();
        let owls = team("owls");
        store.register_team(owls.clone()).unwrap();
        let asha = PlayerRef {
            player_id: Uuid::new_v4(),
            in_game_name: "ashX".to_string(),
            unique_player_id: "BPUT-FF-0007".to_string(),
            full_name: None,
        };
        store.register_player(asha.clone()).unwrap();

        for (match_number, kills) in [(3, 2), (1, 6), (2, 4)] {
            store
                .record_player_stat(stat(asha.player_id, owls.team_id, match_number, kills))
                .unwrap();
        }
        store
            .record_player_stat(stat(Uuid::new_v4(), owls.team_id, 1, 9))
            .unwrap();

        let history = store
            .fetch_player_history(MatchMode::BattleRoyale, asha.player_id)
            .await
            .unwrap();
        let matches: Vec<(u32, u32)> = history
            .iter()
            .map(|h| (h.record.match_number, h.record.kills))
            .collect();
        assert_eq!(matches, vec![(1, 6), (2, 4), (3, 2)]);
        assert_eq!(history[0].player.as_ref().unwrap().in_game_name, "ashX");
        assert_eq!(history[0].team_name.as_deref(), Some("owls"));

        assert!(store
            .fetch_player_history(MatchMode::ClashSquad, asha.player_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_mutations_emit_change_notices() {
        let store = InMemoryScoreStore::new();
        let mut changes = store.subscribe().into_stream();

        let owls = team("owls");
        store.register_team(owls.clone()).unwrap();
        store
            .upsert_match_result(MatchMode::BattleRoyale, result(owls.team_id, 1, 2, 3, false))
            .unwrap();

        let first = changes.next().await.unwrap().unwrap();
        assert_eq!(first.table, StoreTable::Teams);
        let second = changes.next().await.unwrap().unwrap();
        assert_eq!(second.table, StoreTable::TeamScores(MatchMode::BattleRoyale));
    }

    #[test]
    fn test_from_seed() {
        let owls = team("owls");
        let seed = SeedData {
            teams: vec![owls.clone()],
            br_results: vec![result(owls.team_id, 1, 4, 8, true)],
            ..SeedData::default()
        };

        let store = InMemoryScoreStore::from_seed(seed).unwrap();
        assert_eq!(store.score_row_count(MatchMode::BattleRoyale).unwrap(), 1);
    }
}
