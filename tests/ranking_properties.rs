//! Property tests for the standings ranker

use points_table::standings::{
    compare_battle_royale, latest_per_team, rank_battle_royale_teams, rank_clash_squad_teams,
    top_players_by_kills, with_positions, RankBadge,
};
use points_table::types::{MatchMode, PlayerStatRecord, ScoreRecord};
use proptest::prelude::*;
use std::cmp::Ordering;
use uuid::Uuid;

/// Small value ranges so ties show up often
fn score_records() -> impl Strategy<Value = Vec<ScoreRecord>> {
    prop::collection::vec((0u32..3, 0u32..5, 0u32..8), 0..40).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(idx, (booyah, standing, total))| {
                let mut record = ScoreRecord::empty(Uuid::new_v4(), MatchMode::BattleRoyale);
                // match_number carries the input index for stability checks
                record.match_number = idx as u32;
                record.booyah_count = booyah;
                record.total_standing_points = standing;
                record.total_points = total;
                record
            })
            .collect()
    })
}

fn player_records() -> impl Strategy<Value = Vec<PlayerStatRecord>> {
    prop::collection::vec(0u32..10, 0..40).prop_map(|kills| {
        kills
            .into_iter()
            .enumerate()
            .map(|(idx, kills)| PlayerStatRecord {
                player_id: Uuid::new_v4(),
                team_id: Uuid::new_v4(),
                mode: MatchMode::BattleRoyale,
                match_number: idx as u32,
                kills,
                deaths: None,
                assists: None,
                updated_at: None,
            })
            .collect()
    })
}

fn sorted_ids(records: &[ScoreRecord]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = records.iter().map(|r| r.team_id).collect();
    ids.sort();
    ids
}

proptest! {
    #[test]
    fn battle_royale_ranking_is_a_sorted_permutation(records in score_records()) {
        let ranked = rank_battle_royale_teams(records.clone());

        prop_assert_eq!(ranked.len(), records.len());
        prop_assert_eq!(sorted_ids(&ranked), sorted_ids(&records));

        for pair in ranked.windows(2) {
            let order = compare_battle_royale(&pair[0], &pair[1]);
            prop_assert_ne!(order, Ordering::Greater);
            // Full ties keep input order
            if order == Ordering::Equal {
                prop_assert!(pair[0].match_number < pair[1].match_number);
            }
        }
    }

    #[test]
    fn battle_royale_ranking_is_idempotent(records in score_records()) {
        let once = rank_battle_royale_teams(records);
        let twice = rank_battle_royale_teams(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn clash_squad_ranking_orders_total_points(records in score_records()) {
        let ranked = rank_clash_squad_teams(records.clone());

        prop_assert_eq!(ranked.len(), records.len());
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].total_points >= pair[1].total_points);
            if pair[0].total_points == pair[1].total_points {
                prop_assert!(pair[0].match_number < pair[1].match_number);
            }
        }
        prop_assert_eq!(rank_clash_squad_teams(ranked.clone()), ranked);
    }

    #[test]
    fn top_players_are_the_highest_kills(records in player_records(), limit in 1usize..20) {
        let top = top_players_by_kills(records.clone(), limit).unwrap();

        prop_assert_eq!(top.len(), limit.min(records.len()));
        for pair in top.windows(2) {
            prop_assert!(pair[0].kills >= pair[1].kills);
        }

        // Nothing left out beats anything kept
        if let Some(lowest_kept) = top.last() {
            let kept: Vec<Uuid> = top.iter().map(|r| r.player_id).collect();
            for record in records.iter().filter(|r| !kept.contains(&r.player_id)) {
                prop_assert!(record.kills <= lowest_kept.kills);
            }
        }
    }

    #[test]
    fn positions_and_badges_follow_rank(records in score_records()) {
        let ranked = with_positions(rank_battle_royale_teams(records));

        for (idx, entry) in ranked.iter().enumerate() {
            prop_assert_eq!(entry.position, idx + 1);
            prop_assert_eq!(entry.badge, RankBadge::from_position(idx + 1));
        }
    }

    #[test]
    fn latest_per_team_keeps_one_row_per_team(
        rows in prop::collection::vec((0usize..5, 1u32..6, 0u32..50), 0..30)
    ) {
        let teams: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let records: Vec<ScoreRecord> = rows
            .iter()
            .map(|&(team, match_number, total)| {
                let mut record = ScoreRecord::empty(teams[team], MatchMode::BattleRoyale);
                record.match_number = match_number;
                record.total_points = total;
                record
            })
            .collect();

        let latest = latest_per_team(records.clone());

        let mut seen: Vec<Uuid> = latest.iter().map(|r| r.team_id).collect();
        seen.sort();
        seen.dedup();
        prop_assert_eq!(seen.len(), latest.len());

        for record in &latest {
            let highest = records
                .iter()
                .filter(|r| r.team_id == record.team_id)
                .map(|r| r.match_number)
                .max();
            prop_assert_eq!(Some(record.match_number), highest);
        }
    }
}

#[test]
fn zero_limit_is_rejected() {
    assert!(top_players_by_kills(Vec::<PlayerStatRecord>::new(), 0).is_err());
}
