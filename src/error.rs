//! Error types for the standings service
//!
//! This module defines the error taxonomy used throughout the crate. Typed
//! errors are raised with thiserror and carried through anyhow so callers can
//! downcast when they need to tell contract violations apart from store
//! failures.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific standings scenarios
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StandingsError {
    #[error("Negative value for {field} in {table} row: {value}")]
    NegativeField {
        table: &'static str,
        field: &'static str,
        value: i64,
    },

    #[error("Value for {field} in {table} row is out of range: {value}")]
    FieldOutOfRange {
        table: &'static str,
        field: &'static str,
        value: i64,
    },

    #[error("Invalid leaderboard limit: {limit} (must be greater than 0)")]
    InvalidLimit { limit: usize },

    #[error("Team not registered: {team_id}")]
    UnknownTeam { team_id: uuid::Uuid },

    #[error("Unknown match mode: {value}")]
    UnknownMode { value: String },

    #[error("Score store request failed: {message}")]
    StoreUnavailable { message: String },

    #[error("Malformed store response: {message}")]
    MalformedResponse { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl StandingsError {
    /// Whether the error is a caller contract violation rather than an
    /// environmental failure
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            StandingsError::NegativeField { .. }
                | StandingsError::FieldOutOfRange { .. }
                | StandingsError::InvalidLimit { .. }
                | StandingsError::UnknownMode { .. }
                | StandingsError::UnknownTeam { .. }
        )
    }
}
