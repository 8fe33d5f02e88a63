//! Main application configuration
//!
//! This module defines the configuration structures for the points-table
//! service, including environment variable loading, TOML files and
//! validation.

use crate::refresh::DEFAULT_TOP_PLAYERS_LIMIT;
use crate::registration::RegistrationRules;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub store: StoreSettings,
    pub leaderboard: LeaderboardSettings,
    pub registration: RegistrationRules,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Host the HTTP API binds to
    pub http_host: String,
    /// Port for the HTTP API, health and metrics
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Which score store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Local in-memory store, optionally seeded from a file
    Memory,
    /// Hosted REST backend
    Rest,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "rest" => Ok(StoreBackend::Rest),
            _ => Err(anyhow!("Unknown store backend: {}", s)),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Rest => write!(f, "rest"),
        }
    }
}

/// Score store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    /// Base URL of the REST backend
    pub base_url: String,
    /// Public API key for the REST backend
    pub api_key: String,
    /// How often the REST backend is polled for changes
    pub poll_interval_ms: u64,
    /// Timeout for a single REST request
    pub request_timeout_seconds: u64,
    /// JSON seed file for the in-memory store
    pub seed_file: Option<PathBuf>,
}

/// Leaderboard presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardSettings {
    /// Players shown on each top-players board
    pub top_players_limit: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "points-table".to_string(),
            log_level: "info".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            base_url: String::new(),
            api_key: String::new(),
            poll_interval_ms: 5000,
            request_timeout_seconds: 10,
            seed_file: None,
        }
    }
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self {
            top_players_limit: DEFAULT_TOP_PLAYERS_LIMIT,
        }
    }
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("Invalid {} value: {}", key, value)),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still
    /// override file values
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from TOML text without validating it
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| anyhow!("Failed to parse TOML: {}", e))
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            self.service.http_host = host;
        }
        if let Some(port) = parse_env("HTTP_PORT")? {
            self.service.http_port = port;
        }
        if let Some(timeout) = parse_env("SHUTDOWN_TIMEOUT_SECONDS")? {
            self.service.shutdown_timeout_seconds = timeout;
        }

        // Store settings
        if let Some(backend) = parse_env("STORE_BACKEND")? {
            self.store.backend = backend;
        }
        if let Ok(url) = env::var("STORE_URL") {
            self.store.base_url = url;
        }
        if let Ok(key) = env::var("STORE_API_KEY") {
            self.store.api_key = key;
        }
        if let Some(interval) = parse_env("STORE_POLL_INTERVAL_MS")? {
            self.store.poll_interval_ms = interval;
        }
        if let Some(timeout) = parse_env("STORE_REQUEST_TIMEOUT_SECONDS")? {
            self.store.request_timeout_seconds = timeout;
        }
        if let Ok(seed) = env::var("STORE_SEED_FILE") {
            self.store.seed_file = Some(PathBuf::from(seed));
        }

        // Leaderboard settings
        if let Some(limit) = parse_env("TOP_PLAYERS_LIMIT")? {
            self.leaderboard.top_players_limit = limit;
        }

        // Registration settings
        if let Some(deadline) = parse_env::<DateTime<Utc>>("REGISTRATION_DEADLINE")? {
            self.registration.deadline = Some(deadline);
        }
        if let Ok(prefix) = env::var("PLAYER_ID_PREFIX") {
            self.registration.player_id_prefix = prefix;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get REST poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.store.poll_interval_ms)
    }

    /// Get REST request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.store.request_timeout_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate service settings
    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    // Validate store settings
    if config.store.backend == StoreBackend::Rest {
        if config.store.base_url.is_empty() {
            return Err(anyhow!("Store URL cannot be empty for the rest backend"));
        }
        if config.store.api_key.is_empty() {
            return Err(anyhow!("Store API key cannot be empty for the rest backend"));
        }
    }
    if config.store.poll_interval_ms == 0 {
        return Err(anyhow!("Poll interval must be greater than 0"));
    }
    if config.store.request_timeout_seconds == 0 {
        return Err(anyhow!("Request timeout must be greater than 0"));
    }

    // Validate leaderboard settings
    if config.leaderboard.top_players_limit == 0 {
        return Err(anyhow!("Top players limit must be greater than 0"));
    }

    // Validate registration rules
    let rules = &config.registration;
    if rules.player_id_prefix.is_empty() {
        return Err(anyhow!("Player id prefix cannot be empty"));
    }
    if rules.min_team_name_len > rules.max_team_name_len {
        return Err(anyhow!("Team name length bounds are inverted"));
    }
    if rules.min_members == 0 || rules.min_members > rules.max_members {
        return Err(anyhow!("Roster size bounds are invalid"));
    }

    Ok(())
}
