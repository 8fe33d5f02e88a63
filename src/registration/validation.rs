//! Team registration rules
//!
//! Validation collects every violation instead of stopping at the first one,
//! so a form can show all problems at once.

use crate::types::AppRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// Registration closes at 2025-11-05 17:00 IST
pub const DEFAULT_DEADLINE_TIMESTAMP: i64 = 1_762_342_200;

/// Default public player id prefix
pub const DEFAULT_PLAYER_ID_PREFIX: &str = "BPUT-FF";

/// Length of the code after the prefix, e.g. `0042`
pub const PLAYER_CODE_LEN: usize = 4;

/// One roster slot of a registration form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberEntry {
    /// Public player id, e.g. `BPUT-FF-0042`
    pub player_id: String,
    #[serde(default)]
    pub roles: Vec<AppRole>,
    #[serde(default)]
    pub is_igl: bool,
}

/// A team registration as submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRegistration {
    pub team_name: String,
    /// Uploaded logo file name
    #[serde(default)]
    pub logo_file_name: Option<String>,
    #[serde(default)]
    pub battle_royale: bool,
    #[serde(default)]
    pub clash_squad: bool,
    pub members: Vec<MemberEntry>,
}

/// Tunable registration rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationRules {
    /// Submissions at or after this instant are rejected; `None` keeps
    /// registration open
    pub deadline: Option<DateTime<Utc>>,
    pub player_id_prefix: String,
    pub min_team_name_len: usize,
    pub max_team_name_len: usize,
    pub min_members: usize,
    pub max_members: usize,
}

impl Default for RegistrationRules {
    fn default() -> Self {
        Self {
            deadline: DateTime::<Utc>::from_timestamp(DEFAULT_DEADLINE_TIMESTAMP, 0),
            player_id_prefix: DEFAULT_PLAYER_ID_PREFIX.to_string(),
            min_team_name_len: 3,
            max_team_name_len: 20,
            min_members: 4,
            max_members: 5,
        }
    }
}

impl RegistrationRules {
    /// Whether submissions are accepted at `now`
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.deadline.map_or(true, |deadline| now < deadline)
    }
}

/// A single broken registration rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RegistrationViolation {
    #[error("Registration closed at {deadline}")]
    RegistrationClosed { deadline: DateTime<Utc> },

    #[error("Team name must be {min}-{max} characters, got {len}")]
    TeamNameLength { len: usize, min: usize, max: usize },

    #[error("Roster must have {min}-{max} players, got {count}")]
    RosterSize { count: usize, min: usize, max: usize },

    #[error("Player {slot} has no player id")]
    MissingPlayerId { slot: usize },

    #[error("Player {slot} id '{player_id}' does not match {expected}")]
    MalformedPlayerId {
        slot: usize,
        player_id: String,
        expected: String,
    },

    #[error("Player id '{player_id}' is listed more than once")]
    DuplicatePlayerId { player_id: String },

    #[error("Select at least one mode")]
    NoModeSelected,

    #[error("Exactly one in-game leader is required, got {count}")]
    InGameLeaderCount { count: usize },

    #[error("Player {slot} has no roles")]
    MissingRoles { slot: usize },

    #[error("Team logo '{file_name}' must be a JPG")]
    InvalidLogo { file_name: String },
}

/// Every violation found in a registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("Registration has {} violation(s)", .violations.len())]
pub struct RegistrationError {
    pub violations: Vec<RegistrationViolation>,
}

/// True when exactly one member is marked as in-game leader
pub fn has_single_igl(members: &[MemberEntry]) -> bool {
    members.iter().filter(|m| m.is_igl).count() == 1
}

fn is_well_formed_player_id(player_id: &str, prefix: &str) -> bool {
    player_id
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|code| {
            code.len() == PLAYER_CODE_LEN && code.chars().all(|c| c.is_ascii_alphanumeric())
        })
}

fn is_jpeg_file(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    lower.ends_with(".jpg") || lower.ends_with(".jpeg")
}

/// Check a registration against the rules at time `now`
pub fn validate_registration(
    registration: &TeamRegistration,
    rules: &RegistrationRules,
    now: DateTime<Utc>,
) -> Result<(), RegistrationError> {
    let mut violations = Vec::new();

    if let Some(deadline) = rules.deadline {
        if now >= deadline {
            violations.push(RegistrationViolation::RegistrationClosed { deadline });
        }
    }

    let name_len = registration.team_name.trim().chars().count();
    if name_len < rules.min_team_name_len || name_len > rules.max_team_name_len {
        violations.push(RegistrationViolation::TeamNameLength {
            len: name_len,
            min: rules.min_team_name_len,
            max: rules.max_team_name_len,
        });
    }

    let members = &registration.members;
    if members.len() < rules.min_members || members.len() > rules.max_members {
        violations.push(RegistrationViolation::RosterSize {
            count: members.len(),
            min: rules.min_members,
            max: rules.max_members,
        });
    }

    let expected = format!("{}-{}", rules.player_id_prefix, "X".repeat(PLAYER_CODE_LEN));
    let mut seen = HashSet::new();
    for (idx, member) in members.iter().enumerate() {
        let slot = idx + 1;
        let player_id = member.player_id.trim();

        if player_id.is_empty() {
            violations.push(RegistrationViolation::MissingPlayerId { slot });
        } else if !is_well_formed_player_id(player_id, &rules.player_id_prefix) {
            violations.push(RegistrationViolation::MalformedPlayerId {
                slot,
                player_id: player_id.to_string(),
                expected: expected.clone(),
            });
        } else if !seen.insert(player_id.to_ascii_uppercase()) {
            violations.push(RegistrationViolation::DuplicatePlayerId {
                player_id: player_id.to_string(),
            });
        }

        if member.roles.is_empty() {
            violations.push(RegistrationViolation::MissingRoles { slot });
        }
    }

    if !registration.battle_royale && !registration.clash_squad {
        violations.push(RegistrationViolation::NoModeSelected);
    }

    if !has_single_igl(members) {
        violations.push(RegistrationViolation::InGameLeaderCount {
            count: members.iter().filter(|m| m.is_igl).count(),
        });
    }

    if let Some(file_name) = &registration.logo_file_name {
        if !is_jpeg_file(file_name) {
            violations.push(RegistrationViolation::InvalidLogo {
                file_name: file_name.clone(),
            });
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        debug!(
            "Registration for '{}' rejected with {} violation(s)",
            registration.team_name,
            violations.len()
        );
        Err(RegistrationError { violations })
    }
}
