//! Health reporting for the standings service
//!
//! Health follows the published leaderboard: a ready board is healthy, a
//! failed refresh that still has a board to show is degraded, and having
//! nothing to show is unhealthy.

use crate::refresh::LeaderboardState;
use serde::{Deserialize, Serialize};

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Derive health from the current leaderboard state
    pub fn from_leaderboard_state(state: &LeaderboardState) -> Self {
        match state {
            LeaderboardState::Ready { .. } => HealthStatus::Healthy,
            LeaderboardState::Failed {
                last_good: Some(_), ..
            } => HealthStatus::Degraded,
            LeaderboardState::Failed { last_good: None, .. } | LeaderboardState::Loading => {
                HealthStatus::Unhealthy
            }
        }
    }

    /// Value of the health gauge (0=unhealthy, 1=degraded, 2=healthy)
    pub fn as_gauge(&self) -> u8 {
        match self {
            HealthStatus::Healthy => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 0,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}
