//! HTTP server for leaderboards, health and Prometheus metrics

use crate::api::handlers::{
    health_handler, leaderboard_handler, metrics_handler, player_history_handler, root_handler,
    standings_handler, top_players_handler, validate_registration_handler, ApiState,
};
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to bind the API server to
    pub port: u16,
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Leaderboard API server
pub struct ApiServer {
    config: ApiServerConfig,
    state: ApiState,
    shutdown_tx: watch::Sender<bool>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, state: ApiState) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            state,
            shutdown_tx,
        }
    }

    /// Build the router with all endpoints
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/leaderboard", get(leaderboard_handler))
            .route("/standings/{mode}", get(standings_handler))
            .route("/players/{mode}/top", get(top_players_handler))
            .route("/players/{mode}/{player_id}", get(player_history_handler))
            .route(
                "/registrations/validate",
                post(validate_registration_handler),
            )
            .with_state(self.state.clone())
    }

    /// Bind and serve until `stop` is called
    pub async fn start(&self) -> Result<()> {
        // A stop requested before start is kept in the channel
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if *shutdown_rx.borrow() {
            info!("API server stopped before it started");
            return Ok(());
        }

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid API server address")?;

        let app = self.router();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind API server to {}", addr))?;

        info!("API server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.wait_for(|stopped| *stopped).await;
                info!("API server shutdown signal received");
            })
            .await?;

        info!("API server stopped");
        Ok(())
    }

    /// Signal the server to stop
    pub fn stop(&self) {
        if self.shutdown_tx.receiver_count() == 0 {
            debug!("API server stop requested before it started");
        }
        self.shutdown_tx.send_replace(true);
    }
}
