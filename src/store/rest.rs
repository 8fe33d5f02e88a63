//! Adapter for the hosted REST score backend
//!
//! Reads go through the backend's PostgREST endpoints with the same embedded
//! selects the site uses. Change notifications come from a polling task that
//! compares a cheap per-table fingerprint between polls.

use crate::error::{Result, StandingsError};
use crate::standings::top_players_by_kills;
use crate::store::rows::{decode_player_stats, decode_team_scores};
use crate::store::subscription::{ChangeFeed, ChangeSubscription};
use crate::store::ScoreStore;
use crate::types::{MatchMode, PlayerId, PlayerStanding, StoreTable, TeamStanding};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Embedded select for team score tables
pub const TEAM_SCORE_SELECT: &str = "*,teams:team_id(team_name,unique_team_id,team_logo_url)";

/// Embedded select for player stat tables
pub const PLAYER_STAT_SELECT: &str =
    "*,profiles:user_id(full_name,unique_player_id,in_game_name),teams:team_id(team_name)";

/// Tables watched by the polling task
pub const WATCHED_TABLES: [StoreTable; 5] = [
    StoreTable::TeamScores(MatchMode::BattleRoyale),
    StoreTable::TeamScores(MatchMode::ClashSquad),
    StoreTable::PlayerStats(MatchMode::BattleRoyale),
    StoreTable::PlayerStats(MatchMode::ClashSquad),
    StoreTable::Teams,
];

/// Configuration for the REST store
#[derive(Debug, Clone)]
pub struct RestStoreConfig {
    /// Project URL, e.g. `https://abc.backend.example`
    pub base_url: String,
    /// Public API key sent as `apikey` and bearer token
    pub api_key: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for RestStoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            request_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Cheap summary of a table used to detect changes between polls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFingerprint {
    pub row_count: usize,
    pub latest_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct UpdatedAtRow {
    updated_at: Option<DateTime<Utc>>,
}

impl TableFingerprint {
    fn from_rows(rows: &[UpdatedAtRow]) -> Self {
        Self {
            row_count: rows.len(),
            latest_update: rows.iter().filter_map(|row| row.updated_at).max(),
        }
    }
}

/// Query parameters for reading player stats
pub fn player_stats_query(limit: Option<usize>) -> Vec<(&'static str, String)> {
    let mut query = vec![("select", PLAYER_STAT_SELECT.to_string())];
    if let Some(limit) = limit {
        query.push(("order", "kills.desc.nullslast".to_string()));
        query.push(("limit", limit.to_string()));
    }
    query
}

/// Query parameters for one player's stat rows in match order
pub fn player_history_query(mode: MatchMode, player_id: PlayerId) -> Vec<(&'static str, String)> {
    vec![
        ("select", PLAYER_STAT_SELECT.to_string()),
        ("user_id", format!("eq.{}", player_id)),
        ("order", format!("{}.asc", mode.match_column())),
    ]
}

/// Remember a table's fingerprint and report whether it differs from the
/// previous one. The first fingerprint of a table counts as a change, so
/// writes that land before polling starts are not missed.
pub fn record_fingerprint(
    known: &mut HashMap<StoreTable, TableFingerprint>,
    table: StoreTable,
    fingerprint: TableFingerprint,
) -> bool {
    match known.insert(table, fingerprint.clone()) {
        Some(previous) => previous != fingerprint,
        None => true,
    }
}

/// Score store backed by the hosted REST backend
pub struct RestScoreStore {
    client: reqwest::Client,
    config: RestStoreConfig,
    feed: ChangeFeed,
}

impl RestScoreStore {
    /// Create a new REST store
    pub fn new(config: RestStoreConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(StandingsError::ConfigurationError {
                message: "REST store base URL cannot be empty".to_string(),
            }
            .into());
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| StandingsError::ConfigurationError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            config,
            feed: ChangeFeed::default(),
        })
    }

    /// REST endpoint of a backend table
    pub fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            table
        )
    }

    async fn get_rows(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<u8>> {
        let url = self.table_url(table);
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(&url)
            .query(query)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| StandingsError::StoreUnavailable {
                message: format!("{}: {}", table, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StandingsError::StoreUnavailable {
                message: format!("{} returned {}: {}", table, status, body),
            }
            .into());
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| StandingsError::StoreUnavailable {
                message: format!("{}: failed to read body: {}", table, e),
            })?;
        Ok(body.to_vec())
    }

    /// Fetch the change-detection fingerprint of one table
    pub async fn table_fingerprint(&self, table: StoreTable) -> Result<TableFingerprint> {
        let body = self
            .get_rows(table.name(), &[("select", "updated_at".to_string())])
            .await?;
        let rows: Vec<UpdatedAtRow> =
            serde_json::from_slice(&body).map_err(|e| StandingsError::MalformedResponse {
                message: format!("{}: {}", table.name(), e),
            })?;
        Ok(TableFingerprint::from_rows(&rows))
    }

    /// Spawn the polling task that turns fingerprint changes into notices
    pub fn start_polling(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.poll_interval);
            let mut known: HashMap<StoreTable, TableFingerprint> = HashMap::new();

            info!(
                "Polling {} for changes every {:?}",
                self.config.base_url, self.config.poll_interval
            );

            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        info!("REST store polling stopped");
                        break;
                    }
                    _ = interval.tick() => {
                        self.poll_once(&mut known).await;
                    }
                }
            }
        })
    }

    async fn poll_once(&self, known: &mut HashMap<StoreTable, TableFingerprint>) {
        for table in WATCHED_TABLES {
            match self.table_fingerprint(table).await {
                Ok(fingerprint) => {
                    if record_fingerprint(known, table, fingerprint.clone()) {
                        debug!("Detected change in {}: {:?}", table.name(), fingerprint);
                        self.feed.publish(table);
                    }
                }
                Err(e) => warn!("Failed to poll {}: {}", table.name(), e),
            }
        }
    }
}

#[async_trait]
impl ScoreStore for RestScoreStore {
    async fn fetch_team_scores(&self, mode: MatchMode) -> Result<Vec<TeamStanding>> {
        let body = self
            .get_rows(mode.score_table(), &[("select", TEAM_SCORE_SELECT.to_string())])
            .await?;
        decode_team_scores(mode, &body)
    }

    async fn fetch_player_stats(
        &self,
        mode: MatchMode,
        limit: Option<usize>,
    ) -> Result<Vec<PlayerStanding>> {
        if limit == Some(0) {
            return Err(StandingsError::InvalidLimit { limit: 0 }.into());
        }

        let body = self
            .get_rows(mode.player_table(), &player_stats_query(limit))
            .await?;
        let stats = decode_player_stats(mode, &body)?;

        match limit {
            Some(limit) => top_players_by_kills(stats, limit),
            None => Ok(stats),
        }
    }

    async fn fetch_player_history(
        &self,
        mode: MatchMode,
        player_id: PlayerId,
    ) -> Result<Vec<PlayerStanding>> {
        let body = self
            .get_rows(mode.player_table(), &player_history_query(mode, player_id))
            .await?;
        decode_player_stats(mode, &body)
    }

    fn subscribe(&self) -> ChangeSubscription {
        self.feed.subscribe()
    }
}
