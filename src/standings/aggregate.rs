//! Reduction of per-match score rows to one aggregate row per team
//!
//! The store may keep one row per (team, match). Each row already carries the
//! cumulative `total_*` fields, so the latest row is the team's standing.
//! Rows are never summed.

use crate::types::{ScoreRecord, TeamId, TeamStanding};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Identity and recency of a score row
pub trait AggregateRow {
    fn team_id(&self) -> TeamId;
    fn match_number(&self) -> u32;
    fn updated_at(&self) -> Option<DateTime<Utc>>;
}

impl AggregateRow for ScoreRecord {
    fn team_id(&self) -> TeamId {
        self.team_id
    }

    fn match_number(&self) -> u32 {
        self.match_number
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl AggregateRow for TeamStanding {
    fn team_id(&self) -> TeamId {
        self.record.team_id
    }

    fn match_number(&self) -> u32 {
        self.record.match_number
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.record.updated_at
    }
}

/// Keep only the latest row per team
///
/// Latest means highest match number, then latest `updated_at`, then the row
/// seen last. Teams keep the position of their first row, so a later ranking
/// pass still has a deterministic fallback order.
pub fn latest_per_team<T: AggregateRow>(rows: Vec<T>) -> Vec<T> {
    let row_count = rows.len();
    let mut latest: Vec<T> = Vec::with_capacity(row_count);
    let mut index_by_team: HashMap<TeamId, usize> = HashMap::new();

    for row in rows {
        match index_by_team.get(&row.team_id()) {
            Some(&idx) => {
                let current = &latest[idx];
                let newer = (row.match_number(), row.updated_at())
                    >= (current.match_number(), current.updated_at());
                if newer {
                    latest[idx] = row;
                }
            }
            None => {
                index_by_team.insert(row.team_id(), latest.len());
                latest.push(row);
            }
        }
    }

    if latest.len() != row_count {
        debug!(
            "Reduced {} score rows to {} team aggregates",
            row_count,
            latest.len()
        );
    }

    latest
}
