//! Main application state and service coordination
//!
//! This module contains the AppState that wires the score store, the
//! standings refresher and the HTTP API together and manages their
//! background tasks.

use crate::api::{ApiServer, ApiServerConfig, ApiState};
use crate::config::{AppConfig, StoreBackend};
use crate::metrics::MetricsCollector;
use crate::refresh::{LeaderboardState, StandingsRefresher};
use crate::store::{InMemoryScoreStore, RestScoreStore, RestStoreConfig, ScoreStore};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Score store error: {message}")]
    Store { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Score store the leaderboard is read from
    store: Arc<dyn ScoreStore>,

    /// Set when the REST backend is used, for its polling task
    rest_store: Option<Arc<RestScoreStore>>,

    /// Refresher publishing ranked snapshots
    refresher: Arc<StandingsRefresher>,

    /// Metrics shared by the refresher and the API
    metrics: Arc<MetricsCollector>,

    /// HTTP API server
    api_server: Arc<ApiServer>,

    /// Shutdown signal for background tasks
    shutdown_tx: broadcast::Sender<()>,

    /// Background task handles
    background_tasks: Vec<JoinHandle<()>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,
}

impl AppState {
    /// Initialize the application with the store selected by the configuration
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing points-table standings service");
        info!(
            "Configuration: service={}, backend={}",
            config.service.name, config.store.backend
        );

        match config.store.backend {
            StoreBackend::Memory => {
                let store = Self::initialize_memory_store(&config)?;
                Self::with_store(config, store, None)
            }
            StoreBackend::Rest => {
                let store = Self::initialize_rest_store(&config)?;
                Self::with_store(config, store.clone(), Some(store))
            }
        }
    }

    /// Initialize the application around an existing store
    pub fn with_store(
        config: AppConfig,
        store: Arc<dyn ScoreStore>,
        rest_store: Option<Arc<RestScoreStore>>,
    ) -> Result<Self, ServiceError> {
        let metrics = Arc::new(
            MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                message: format!("Failed to create metrics collector: {}", e),
            })?,
        );

        let refresher = Arc::new(
            StandingsRefresher::new(store.clone(), config.leaderboard.top_players_limit)
                .with_metrics(metrics.clone()),
        );

        let api_state = ApiState {
            service_name: config.service.name.clone(),
            leaderboard: refresher.subscribe(),
            store: store.clone(),
            metrics: metrics.clone(),
            registration_rules: Arc::new(config.registration.clone()),
        };
        let api_config = ApiServerConfig {
            host: config.service.http_host.clone(),
            port: config.service.http_port,
        };
        let api_server = Arc::new(ApiServer::new(api_config, api_state));

        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            config,
            store,
            rest_store,
            refresher,
            metrics,
            api_server,
            shutdown_tx,
            background_tasks: Vec::new(),
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    fn initialize_memory_store(config: &AppConfig) -> Result<Arc<dyn ScoreStore>, ServiceError> {
        let store = match &config.store.seed_file {
            Some(path) => {
                InMemoryScoreStore::from_seed_file(path).map_err(|e| ServiceError::Store {
                    message: format!("Failed to seed in-memory store: {}", e),
                })?
            }
            None => {
                info!("Starting with an empty in-memory store");
                InMemoryScoreStore::new()
            }
        };
        Ok(Arc::new(store))
    }

    fn initialize_rest_store(config: &AppConfig) -> Result<Arc<RestScoreStore>, ServiceError> {
        info!("Connecting to REST score backend: {}", config.store.base_url);

        let rest_config = RestStoreConfig {
            base_url: config.store.base_url.clone(),
            api_key: config.store.api_key.clone(),
            request_timeout: config.request_timeout(),
            poll_interval: config.poll_interval(),
        };
        let store = RestScoreStore::new(rest_config).map_err(|e| ServiceError::Configuration {
            message: format!("Failed to create REST store: {}", e),
        })?;
        Ok(Arc::new(store))
    }

    /// Start the refresher, the store poller and the HTTP API
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        info!("Starting points-table standings service");

        *self.is_running.write().await = true;

        // Refresher first so it subscribes before any poll can publish
        let refresher_task = self
            .refresher
            .clone()
            .spawn(self.shutdown_tx.subscribe());
        self.background_tasks.push(refresher_task);

        if let Some(rest_store) = &self.rest_store {
            let polling_task = rest_store.clone().start_polling(self.shutdown_tx.subscribe());
            self.background_tasks.push(polling_task);
        }

        let api_server = self.api_server.clone();
        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.start().await {
                error!("API server failed: {}", e);
            } else {
                info!("API server task completed");
            }
        });
        self.background_tasks.push(api_task);

        info!(
            "✅ Points-table service started on {}:{}",
            self.config.service.http_host, self.config.service.http_port
        );
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of points-table service");

        *self.is_running.write().await = false;

        if self.shutdown_tx.send(()).is_err() {
            debug!("No background task was listening for shutdown");
        }
        self.api_server.stop();

        self.stop_background_tasks().await;

        let final_state = self.refresher.current();
        info!(
            "Final leaderboard generation: {}",
            final_state.generation()
        );
        info!("✅ Points-table service shutdown completed");
        Ok(())
    }

    async fn stop_background_tasks(&mut self) {
        let task_count = self.background_tasks.len();
        if task_count == 0 {
            info!("No background tasks to stop");
            return;
        }

        info!("Waiting for {} background tasks to stop...", task_count);
        let timeout = self.config.shutdown_timeout();

        for (i, mut task) in self.background_tasks.drain(..).enumerate() {
            match tokio::time::timeout(timeout, &mut task).await {
                Ok(Ok(())) => debug!("Background task {}/{} stopped", i + 1, task_count),
                Ok(Err(e)) => warn!("Background task {}/{} failed: {}", i + 1, task_count, e),
                Err(_) => {
                    warn!(
                        "Background task {}/{} did not stop within {:?}, aborting",
                        i + 1,
                        task_count,
                        timeout
                    );
                    task.abort();
                }
            }
        }

        info!("✅ All {} background tasks stopped", task_count);
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get the score store
    pub fn store(&self) -> Arc<dyn ScoreStore> {
        self.store.clone()
    }

    /// Get the standings refresher
    pub fn refresher(&self) -> Arc<StandingsRefresher> {
        self.refresher.clone()
    }

    /// Observe published leaderboard states
    pub fn leaderboard(&self) -> watch::Receiver<LeaderboardState> {
        self.refresher.subscribe()
    }

    /// Get the metrics collector
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Get the API server
    pub fn api_server(&self) -> Arc<ApiServer> {
        self.api_server.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.service.http_host = "127.0.0.1".to_string();
        // Port 0 is only rejected by validate_config; binding picks a free port
        config.service.http_port = 0;
        config.service.shutdown_timeout_seconds = 2;
        config
    }

    #[tokio::test]
    async fn test_memory_backend_lifecycle() {
        let mut app = AppState::new(test_config()).await.unwrap();
        assert!(!app.is_running().await);

        let mut leaderboard = app.leaderboard();
        app.start().await.unwrap();
        assert!(app.is_running().await);

        tokio::time::timeout(
            Duration::from_secs(2),
            leaderboard.wait_for(|state| state.is_ready()),
        )
        .await
        .unwrap()
        .unwrap();

        app.shutdown().await.unwrap();
        assert!(!app.is_running().await);
    }

    #[tokio::test]
    async fn test_rest_backend_requires_url() {
        let mut config = test_config();
        config.store.backend = StoreBackend::Rest;

        let err = AppState::new(config).await.err().unwrap();
        assert!(matches!(err, ServiceError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_missing_seed_file_fails() {
        let mut config = test_config();
        config.store.seed_file = Some("/nonexistent/seed.json".into());

        let err = AppState::new(config).await.err().unwrap();
        assert!(matches!(err, ServiceError::Store { .. }));
    }
}
