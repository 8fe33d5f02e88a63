//! Rank badges and 1-based positions for rendered leaderboards

use serde::{Deserialize, Serialize};

/// Display classification of a leaderboard position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankBadge {
    First,
    Second,
    Third,
    Unranked,
}

impl RankBadge {
    /// Classify a 1-based position. Position 0 is not a rank and maps to
    /// `Unranked`.
    pub fn from_position(position: usize) -> Self {
        match position {
            1 => RankBadge::First,
            2 => RankBadge::Second,
            3 => RankBadge::Third,
            _ => RankBadge::Unranked,
        }
    }

    /// Whether the position earns a podium badge
    pub fn is_podium(&self) -> bool {
        !matches!(self, RankBadge::Unranked)
    }
}

impl std::fmt::Display for RankBadge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankBadge::First => write!(f, "first"),
            RankBadge::Second => write!(f, "second"),
            RankBadge::Third => write!(f, "third"),
            RankBadge::Unranked => write!(f, "unranked"),
        }
    }
}

/// An entry of a ranked sequence with its position and badge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranked<T> {
    pub position: usize,
    pub badge: RankBadge,
    #[serde(flatten)]
    pub entry: T,
}

/// Attach positions to an already ranked sequence
pub fn with_positions<T>(ranked: Vec<T>) -> Vec<Ranked<T>> {
    ranked
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            let position = idx + 1;
            Ranked {
                position,
                badge: RankBadge::from_position(position),
                entry,
            }
        })
        .collect()
}
