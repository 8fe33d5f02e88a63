//! Integration tests for the points-table standings service
//!
//! These tests run the whole pipeline together:
//! - In-memory store maintaining cumulative aggregates
//! - Change notices driving full snapshot refreshes
//! - Ranking, positions and badges on the published leaderboard
//! - The HTTP API reading the published state

mod fixtures;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use points_table::api::{ApiServer, ApiServerConfig, ApiState};
use points_table::metrics::MetricsCollector;
use futures::future::join_all;
use points_table::refresh::{Leaderboard, LeaderboardState, RefreshOutcome, StandingsRefresher};
use points_table::registration::RegistrationRules;
use points_table::standings::RankBadge;
use points_table::types::MatchMode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tower::ServiceExt;

use fixtures::TournamentFixture;

async fn wait_for_generation(
    states: &mut watch::Receiver<LeaderboardState>,
    generation: u64,
) -> Leaderboard {
    let state = tokio::time::timeout(
        Duration::from_secs(5),
        states.wait_for(|state| state.is_ready() && state.generation() >= generation),
    )
    .await
    .expect("timed out waiting for leaderboard")
    .expect("refresher dropped")
    .clone();

    state.leaderboard().cloned().expect("ready state has a leaderboard")
}

fn team_names(leaderboard: &Leaderboard, mode: MatchMode) -> Vec<String> {
    leaderboard
        .teams(mode)
        .iter()
        .map(|ranked| {
            ranked
                .entry
                .team
                .as_ref()
                .map(|team| team.team_name.clone())
                .unwrap_or_default()
        })
        .collect()
}

#[tokio::test]
async fn test_battle_royale_scenario_end_to_end() {
    let tournament = TournamentFixture::new(&["X", "Y", "Z"]);

    // X: booyah 1, standing 30, total 50
    tournament.play_br(0, 1, 20, 30, true);
    // Y: booyah 2, standing 10, total 20
    tournament.play_br(1, 1, 5, 5, true);
    tournament.play_br(1, 2, 5, 5, true);
    // Z: booyah 1, standing 40, total 60
    tournament.play_br(2, 1, 10, 20, true);
    tournament.play_br(2, 2, 10, 20, false);

    let refresher = StandingsRefresher::new(tournament.store.clone(), 15);
    refresher.refresh().await.unwrap();

    let state = refresher.current();
    let leaderboard = state.leaderboard().unwrap();
    assert_eq!(team_names(leaderboard, MatchMode::BattleRoyale), vec!["Y", "Z", "X"]);

    let z = &leaderboard.br_teams[1];
    assert_eq!(z.position, 2);
    assert_eq!(z.badge, RankBadge::Second);
    assert_eq!(z.entry.record.booyah_count, 1);
    assert_eq!(z.entry.record.total_standing_points, 40);
    assert_eq!(z.entry.record.total_points, 60);
    assert_eq!(leaderboard.br_teams[2].badge, RankBadge::Third);
}

#[tokio::test]
async fn test_clash_squad_scenario_keeps_input_order_on_ties() {
    let tournament = TournamentFixture::new(&["A", "B", "C"]);

    tournament.play_cs(0, 1, 40, 60);
    tournament.play_cs(1, 1, 50, 70);
    tournament.play_cs(2, 1, 60, 60);

    let refresher = StandingsRefresher::new(tournament.store.clone(), 15);
    refresher.refresh().await.unwrap();

    let state = refresher.current();
    let leaderboard = state.leaderboard().unwrap();
    assert_eq!(team_names(leaderboard, MatchMode::ClashSquad), vec!["B", "C", "A"]);
    assert!(leaderboard.br_teams.is_empty());
}

#[tokio::test]
async fn test_refresher_follows_live_updates() {
    let tournament = TournamentFixture::new(&["Alpha", "Bravo", "Charlie"]);
    tournament.play_br(0, 1, 8, 12, true);
    tournament.play_br(1, 1, 3, 9, false);

    let metrics = Arc::new(MetricsCollector::new().unwrap());
    let refresher = Arc::new(
        StandingsRefresher::new(tournament.store.clone(), 15).with_metrics(metrics.clone()),
    );
    let mut states = refresher.subscribe();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = refresher.clone().spawn(shutdown_rx);

    let initial = wait_for_generation(&mut states, 1).await;
    assert_eq!(
        team_names(&initial, MatchMode::BattleRoyale),
        vec!["Alpha", "Bravo"]
    );

    // Charlie joins with two booyahs
    tournament.play_br(2, 1, 6, 12, true);
    tournament.play_br(2, 2, 6, 12, true);

    let updated = tokio::time::timeout(
        Duration::from_secs(5),
        states.wait_for(|state| {
            state
                .leaderboard()
                .map(|board| board.br_teams.len() == 3 && board.br_teams[0].entry.record.booyah_count == 2)
                .unwrap_or(false)
        }),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    let leaderboard = updated.leaderboard().unwrap();
    assert_eq!(
        team_names(leaderboard, MatchMode::BattleRoyale),
        vec!["Charlie", "Alpha", "Bravo"]
    );
    assert!(metrics.refresh().leaderboard_generation.get() >= 2);

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_top_players_are_limited_and_sorted() {
    let names: Vec<String> = (0..20).map(|i| format!("Team{:02}", i)).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let tournament = TournamentFixture::new(&name_refs);

    for idx in 0..20 {
        tournament.frag(idx, MatchMode::BattleRoyale, 1, (idx as u32) * 3 + 1);
    }
    tournament.frag(0, MatchMode::ClashSquad, 1, 4);

    let refresher = StandingsRefresher::new(tournament.store.clone(), 15);
    refresher.refresh().await.unwrap();

    let state = refresher.current();
    let leaderboard = state.leaderboard().unwrap();

    let kills: Vec<u32> = leaderboard
        .br_players
        .iter()
        .map(|ranked| ranked.entry.record.kills)
        .collect();
    let expected: Vec<u32> = (5..20).rev().map(|idx| idx * 3 + 1).collect();
    assert_eq!(kills, expected);
    assert_eq!(leaderboard.br_players[0].badge, RankBadge::First);
    assert_eq!(
        leaderboard.br_players[0].entry.team_name.as_deref(),
        Some("Team19")
    );
    assert_eq!(leaderboard.cs_players.len(), 1);
}

#[tokio::test]
async fn test_api_serves_refreshed_leaderboard() {
    let tournament = TournamentFixture::new(&["Alpha", "Bravo"]);
    tournament.play_br(0, 1, 2, 4, false);
    tournament.play_br(1, 1, 1, 2, true);
    tournament.frag(0, MatchMode::BattleRoyale, 1, 2);
    tournament.frag(1, MatchMode::BattleRoyale, 1, 1);

    let metrics = Arc::new(MetricsCollector::new().unwrap());
    let refresher = StandingsRefresher::new(tournament.store.clone(), 15).with_metrics(metrics.clone());

    let state = ApiState {
        service_name: "points-table".to_string(),
        leaderboard: refresher.subscribe(),
        store: tournament.store.clone(),
        metrics,
        registration_rules: Arc::new(RegistrationRules::default()),
    };
    let router = ApiServer::new(ApiServerConfig::default(), state).router();

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/standings/br").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    refresher.refresh().await.unwrap();

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/standings/br").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let standings = body["standings"].as_array().unwrap();
    assert_eq!(standings[0]["team"]["team_name"], "Bravo");
    assert_eq!(standings[0]["badge"], "first");
    assert_eq!(standings[1]["team"]["team_name"], "Alpha");

    let response = router
        .oneshot(
            Request::builder()
                .uri("/players/br/top?limit=1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let players = body["players"].as_array().unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0]["kills"], 2);
    assert_eq!(players[0]["team_name"], "Alpha");
}

#[tokio::test]
async fn test_seed_file_round_trip() {
    let seed = serde_json::json!({
        "teams": [
            {"team_id": "6f1c1c9e-4a52-4c1a-9a61-2d3c4b5a6f70", "team_name": "Seeded", "unique_team_id": "BPUT-T-0001", "team_logo_url": null}
        ],
        "br_results": [
            {"team_id": "6f1c1c9e-4a52-4c1a-9a61-2d3c4b5a6f70", "match_number": 1, "kills": 7, "standing_points": 12, "booyah": true}
        ]
    });
    let path = std::env::temp_dir().join(format!("points-table-seed-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, seed.to_string()).unwrap();

    let store = points_table::InMemoryScoreStore::from_seed_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let refresher = StandingsRefresher::new(Arc::new(store), 15);
    refresher.refresh().await.unwrap();

    let state = refresher.current();
    let team = &state.leaderboard().unwrap().br_teams[0];
    assert_eq!(team.entry.record.total_points, 19);
    assert_eq!(team.entry.record.booyah_count, 1);
}

#[tokio::test]
async fn test_concurrent_refreshes_publish_the_newest_snapshot() {
    let tournament = TournamentFixture::new(&["Alpha", "Bravo"]);
    tournament.play_br(0, 1, 4, 6, true);
    tournament.play_br(1, 1, 2, 3, false);

    let refresher = StandingsRefresher::new(tournament.store.clone(), 15);
    let outcomes: Vec<RefreshOutcome> = join_all((0..8).map(|_| refresher.refresh()))
        .await
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    let mut generations: Vec<u64> = outcomes.iter().map(RefreshOutcome::generation).collect();
    generations.sort_unstable();
    assert_eq!(generations, (1..=8).collect::<Vec<u64>>());

    // The newest generation can never be discarded
    assert!(outcomes.contains(&RefreshOutcome::Published { generation: 8 }));

    let state = refresher.current();
    assert_eq!(state.generation(), 8);
    assert_eq!(
        team_names(state.leaderboard().unwrap(), MatchMode::BattleRoyale),
        vec!["Alpha", "Bravo"]
    );
}

#[tokio::test]
async fn test_registered_team_without_scores_is_not_listed() {
    let tournament = TournamentFixture::new(&["Scored", "Idle"]);
    tournament.play_br(0, 1, 3, 5, false);

    let refresher = StandingsRefresher::new(tournament.store.clone(), 15);
    refresher.refresh().await.unwrap();

    let state = refresher.current();
    let leaderboard = state.leaderboard().unwrap();
    assert_eq!(team_names(leaderboard, MatchMode::BattleRoyale), vec!["Scored"]);
    assert!(leaderboard.cs_teams.is_empty());
}

#[tokio::test]
async fn test_player_history_over_api() {
    let tournament = TournamentFixture::new(&["Alpha", "Bravo"]);
    tournament.frag(0, MatchMode::BattleRoyale, 2, 7);
    tournament.frag(0, MatchMode::BattleRoyale, 1, 3);
    tournament.frag(1, MatchMode::BattleRoyale, 1, 9);

    let refresher = StandingsRefresher::new(tournament.store.clone(), 15);
    let state = ApiState {
        service_name: "points-table".to_string(),
        leaderboard: refresher.subscribe(),
        store: tournament.store.clone(),
        metrics: Arc::new(MetricsCollector::new().unwrap()),
        registration_rules: Arc::new(RegistrationRules::default()),
    };
    let router = ApiServer::new(ApiServerConfig::default(), state).router();

    // History reads the store directly, so it works before the first refresh
    let uri = format!("/players/br/{}", tournament.players[0].player_id);
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let kills: Vec<u64> = body["matches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["kills"].as_u64().unwrap())
        .collect();
    assert_eq!(kills, vec![3, 7]);
    assert_eq!(body["total_kills"], 10);
    assert_eq!(body["player"]["in_game_name"], "alpha_igl");
    assert_eq!(body["matches"][0]["team_name"], "Alpha");
}
