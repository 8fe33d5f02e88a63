//! Request handlers for the leaderboard API

use crate::error::StandingsError;
use crate::metrics::MetricsCollector;
use crate::refresh::{Leaderboard, LeaderboardState};
use crate::registration::{validate_registration, RegistrationRules, TeamRegistration};
use crate::service::health::HealthStatus;
use crate::standings::top_players_by_kills;
use crate::store::ScoreStore;
use crate::types::{MatchMode, PlayerId};
use crate::utils::current_timestamp;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, warn};

/// Shared state for all handlers
#[derive(Clone)]
pub struct ApiState {
    pub service_name: String,
    pub leaderboard: watch::Receiver<LeaderboardState>,
    pub store: Arc<dyn ScoreStore>,
    pub metrics: Arc<MetricsCollector>,
    pub registration_rules: Arc<RegistrationRules>,
}

impl ApiState {
    fn respond(&self, endpoint: &str, status: StatusCode, body: Value) -> Response {
        self.metrics.record_http_request(endpoint, status.as_u16());
        (status, Json(body)).into_response()
    }

    /// Leaderboard to serve, or the 503 response explaining why there is none
    fn ready_leaderboard(&self, endpoint: &str) -> Result<Leaderboard, Response> {
        let body = {
            let current = self.leaderboard.borrow();
            if let Some(leaderboard) = current.leaderboard() {
                return Ok(leaderboard.clone());
            }
            match &*current {
                LeaderboardState::Failed { message, .. } => {
                    json!({ "status": "failed", "error": message })
                }
                _ => json!({ "status": "loading" }),
            }
        };

        Err(self.respond(endpoint, StatusCode::SERVICE_UNAVAILABLE, body))
    }

    fn parse_mode(&self, endpoint: &str, raw: &str) -> Result<MatchMode, Response> {
        raw.parse::<MatchMode>().map_err(|e| {
            self.respond(
                endpoint,
                StatusCode::BAD_REQUEST,
                json!({ "error": e.to_string() }),
            )
        })
    }
}

fn status_label(state: &LeaderboardState) -> &'static str {
    match state {
        LeaderboardState::Loading => "loading",
        LeaderboardState::Ready { .. } => "ready",
        LeaderboardState::Failed { .. } => "failed",
    }
}

/// Root endpoint handler - shows service information
pub async fn root_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let info = json!({
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/health",
            "/metrics",
            "/leaderboard",
            "/standings/{mode}",
            "/players/{mode}/top",
            "/players/{mode}/{player_id}",
            "/registrations/validate"
        ]
    });

    Json(info)
}

/// Health endpoint handler derived from the published leaderboard state
pub async fn health_handler(State(state): State<ApiState>) -> Response {
    debug!("Health check requested");

    let (health, generation, label) = {
        let current = state.leaderboard.borrow();
        (
            HealthStatus::from_leaderboard_state(&current),
            current.generation(),
            status_label(&current),
        )
    };
    state.metrics.update_health_status(health.as_gauge());

    let status = if health == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    state.respond(
        "/health",
        status,
        json!({
            "status": health,
            "leaderboard": label,
            "generation": generation,
            "service": state.service_name,
            "version": env!("CARGO_PKG_VERSION")
        }),
    )
}

/// Prometheus metrics endpoint handler
pub async fn metrics_handler(State(state): State<ApiState>) -> Response {
    debug!("Metrics endpoint requested");

    let metric_families = state.metrics.registry().gather();
    let encoder = TextEncoder::new();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", encoder.format_type().to_string())],
            buffer,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}

/// Whole leaderboard snapshot together with its state
pub async fn leaderboard_handler(State(state): State<ApiState>) -> Response {
    let (label, error_message) = {
        let current = state.leaderboard.borrow();
        let message = match &*current {
            LeaderboardState::Failed { message, .. } => Some(message.clone()),
            _ => None,
        };
        (status_label(&current), message)
    };

    let leaderboard = match state.ready_leaderboard("/leaderboard") {
        Ok(leaderboard) => leaderboard,
        Err(response) => return response,
    };

    state.respond(
        "/leaderboard",
        StatusCode::OK,
        json!({
            "status": label,
            "error": error_message,
            "leaderboard": leaderboard,
        }),
    )
}

/// Ranked team standings of one mode
pub async fn standings_handler(
    State(state): State<ApiState>,
    Path(mode): Path<String>,
) -> Response {
    const ENDPOINT: &str = "/standings";

    let mode = match state.parse_mode(ENDPOINT, &mode) {
        Ok(mode) => mode,
        Err(response) => return response,
    };
    let leaderboard = match state.ready_leaderboard(ENDPOINT) {
        Ok(leaderboard) => leaderboard,
        Err(response) => return response,
    };

    state.respond(
        ENDPOINT,
        StatusCode::OK,
        json!({
            "mode": mode,
            "generation": leaderboard.generation,
            "refreshed_at": leaderboard.refreshed_at,
            "standings": leaderboard.teams(mode),
        }),
    )
}

/// Query string of the top players endpoint
#[derive(Debug, Deserialize)]
pub struct TopPlayersQuery {
    pub limit: Option<usize>,
}

/// Top players of one mode, optionally cut to a smaller limit
pub async fn top_players_handler(
    State(state): State<ApiState>,
    Path(mode): Path<String>,
    Query(query): Query<TopPlayersQuery>,
) -> Response {
    const ENDPOINT: &str = "/players/top";

    let mode = match state.parse_mode(ENDPOINT, &mode) {
        Ok(mode) => mode,
        Err(response) => return response,
    };
    let leaderboard = match state.ready_leaderboard(ENDPOINT) {
        Ok(leaderboard) => leaderboard,
        Err(response) => return response,
    };

    let players = leaderboard.players(mode).to_vec();
    let players = match query.limit {
        Some(limit) => match top_players_by_kills(players, limit) {
            Ok(players) => players,
            Err(e) => {
                let status = match e.downcast_ref::<StandingsError>() {
                    Some(err) if err.is_contract_violation() => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                return state.respond(ENDPOINT, status, json!({ "error": e.to_string() }));
            }
        },
        None => players,
    };

    state.respond(
        ENDPOINT,
        StatusCode::OK,
        json!({
            "mode": mode,
            "generation": leaderboard.generation,
            "players": players,
        }),
    )
}

/// Match-by-match stats of one player, read straight from the store
pub async fn player_history_handler(
    State(state): State<ApiState>,
    Path((mode, player_id)): Path<(String, String)>,
) -> Response {
    const ENDPOINT: &str = "/players/history";

    let mode = match state.parse_mode(ENDPOINT, &mode) {
        Ok(mode) => mode,
        Err(response) => return response,
    };
    let player_id: PlayerId = match player_id.parse() {
        Ok(id) => id,
        Err(_) => {
            return state.respond(
                ENDPOINT,
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Invalid player id: {}", player_id) }),
            )
        }
    };

    let history = match state.store.fetch_player_history(mode, player_id).await {
        Ok(history) => history,
        Err(e) => {
            warn!("Failed to load history of player {}: {}", player_id, e);
            let status = match e.downcast_ref::<StandingsError>() {
                Some(StandingsError::StoreUnavailable { .. }) => StatusCode::SERVICE_UNAVAILABLE,
                Some(_) => StatusCode::BAD_GATEWAY,
                None => StatusCode::INTERNAL_SERVER_ERROR,
            };
            return state.respond(ENDPOINT, status, json!({ "error": e.to_string() }));
        }
    };

    let total_kills: u64 = history.iter().map(|h| u64::from(h.record.kills)).sum();
    let player = history.iter().find_map(|h| h.player.clone());

    state.respond(
        ENDPOINT,
        StatusCode::OK,
        json!({
            "mode": mode,
            "player_id": player_id,
            "player": player,
            "total_kills": total_kills,
            "matches": history,
        }),
    )
}

/// Check a registration form without storing it
pub async fn validate_registration_handler(
    State(state): State<ApiState>,
    Json(registration): Json<TeamRegistration>,
) -> Response {
    const ENDPOINT: &str = "/registrations/validate";

    match validate_registration(&registration, &state.registration_rules, current_timestamp()) {
        Ok(()) => state.respond(ENDPOINT, StatusCode::OK, json!({ "valid": true })),
        Err(e) => {
            let messages: Vec<String> = e.violations.iter().map(|v| v.to_string()).collect();
            state.respond(
                ENDPOINT,
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "valid": false,
                    "violations": e.violations,
                    "messages": messages,
                }),
            )
        }
    }
}
