//! Test fixtures shared by the integration tests

#![allow(dead_code)]

use points_table::store::{InMemoryScoreStore, MatchResult};
use points_table::types::{
    MatchMode, PlayerRef, PlayerStatRecord, ScoreRecord, TeamId, TeamRef, TeamStanding,
};
use std::sync::Arc;
use uuid::Uuid;

/// Build a team identity with a predictable public code
pub fn team(index: usize, name: &str) -> TeamRef {
    TeamRef {
        team_id: Uuid::new_v4(),
        team_name: name.to_string(),
        unique_team_id: format!("BPUT-T-{:04}", index),
        team_logo_url: None,
    }
}

/// Build a player identity with a predictable public code
pub fn player(index: usize, in_game_name: &str) -> PlayerRef {
    PlayerRef {
        player_id: Uuid::new_v4(),
        in_game_name: in_game_name.to_string(),
        unique_player_id: format!("BPUT-FF-{:04}", index),
        full_name: None,
    }
}

/// Battle Royale aggregate with only the ranking columns set
pub fn br_record(booyah: u32, standing: u32, total: u32) -> ScoreRecord {
    let mut record = ScoreRecord::empty(Uuid::new_v4(), MatchMode::BattleRoyale);
    record.booyah_count = booyah;
    record.total_standing_points = standing;
    record.total_points = total;
    record
}

/// Clash Squad aggregate with only the ranking columns set
pub fn cs_record(standing: u32, total: u32) -> ScoreRecord {
    let mut record = ScoreRecord::empty(Uuid::new_v4(), MatchMode::ClashSquad);
    record.total_standing_points = standing;
    record.total_points = total;
    record
}

pub fn standing(record: ScoreRecord) -> TeamStanding {
    TeamStanding { record, team: None }
}

pub fn match_result(
    team_id: TeamId,
    match_number: u32,
    kills: u32,
    standing_points: u32,
    booyah: bool,
) -> MatchResult {
    MatchResult {
        team_id,
        match_number,
        kills,
        standing_points,
        booyah,
    }
}

pub fn player_stat(
    player: &PlayerRef,
    team_id: TeamId,
    mode: MatchMode,
    match_number: u32,
    kills: u32,
) -> PlayerStatRecord {
    PlayerStatRecord {
        player_id: player.player_id,
        team_id,
        mode,
        match_number,
        kills,
        deaths: (mode == MatchMode::ClashSquad).then_some(0),
        assists: (mode == MatchMode::ClashSquad).then_some(0),
        updated_at: None,
    }
}

/// A small tournament with registered teams and one player per team
pub struct TournamentFixture {
    pub store: Arc<InMemoryScoreStore>,
    pub teams: Vec<TeamRef>,
    pub players: Vec<PlayerRef>,
}

impl TournamentFixture {
    pub fn new(team_names: &[&str]) -> Self {
        let store = Arc::new(InMemoryScoreStore::new());
        let mut teams = Vec::new();
        let mut players = Vec::new();

        for (idx, name) in team_names.iter().enumerate() {
            let team = team(idx + 1, name);
            store.register_team(team.clone()).unwrap();
            let player = player(idx + 1, &format!("{}_igl", name.to_lowercase()));
            store.register_player(player.clone()).unwrap();
            teams.push(team);
            players.push(player);
        }

        Self {
            store,
            teams,
            players,
        }
    }

    pub fn team_id(&self, idx: usize) -> TeamId {
        self.teams[idx].team_id
    }

    /// Record a Battle Royale match for a team
    pub fn play_br(&self, idx: usize, match_number: u32, kills: u32, standing: u32, booyah: bool) {
        self.store
            .upsert_match_result(
                MatchMode::BattleRoyale,
                match_result(self.team_id(idx), match_number, kills, standing, booyah),
            )
            .unwrap();
    }

    /// Record a Clash Squad round for a team
    pub fn play_cs(&self, idx: usize, round: u32, kills: u32, standing: u32) {
        self.store
            .upsert_match_result(
                MatchMode::ClashSquad,
                match_result(self.team_id(idx), round, kills, standing, false),
            )
            .unwrap();
    }

    /// Record kills for the team's player in one match
    pub fn frag(&self, idx: usize, mode: MatchMode, match_number: u32, kills: u32) {
        let stat = player_stat(&self.players[idx], self.team_id(idx), mode, match_number, kills);
        self.store.record_player_stat(stat).unwrap();
    }
}
