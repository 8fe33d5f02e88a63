//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the points-table service
//! using Prometheus metrics.

use crate::refresh::snapshot::Leaderboard;
use crate::types::StoreTable;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
};
use std::sync::Arc;
use std::time::Duration;

/// Main metrics collector for the standings service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Snapshot refresh metrics
    refresh_metrics: RefreshMetrics,

    /// HTTP API metrics
    api_metrics: ApiMetrics,
}

/// Snapshot refresh metrics
#[derive(Clone)]
pub struct RefreshMetrics {
    /// Refreshes by outcome (success, failure)
    pub refreshes_total: IntCounterVec,

    /// Time to fetch and rank a full snapshot
    pub refresh_duration_seconds: Histogram,

    /// Refresh results dropped because a newer snapshot was already published
    pub stale_discarded_total: IntCounter,

    /// Change notices received, by table
    pub change_notices_total: IntCounterVec,

    /// Notices skipped because the refresher fell behind
    pub lagged_notices_total: IntCounter,

    /// Generation of the published leaderboard
    pub leaderboard_generation: IntGauge,

    /// Entries on each published board
    pub standings_entries: IntGaugeVec,
}

/// HTTP API metrics
#[derive(Clone)]
pub struct ApiMetrics {
    /// Requests by endpoint and status code
    pub http_requests_total: IntCounterVec,

    /// Health status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let refresh_metrics = RefreshMetrics::new(&registry)?;
        let api_metrics = ApiMetrics::new(&registry)?;

        Ok(Self {
            registry,
            refresh_metrics,
            api_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get refresh metrics
    pub fn refresh(&self) -> &RefreshMetrics {
        &self.refresh_metrics
    }

    /// Get API metrics
    pub fn api(&self) -> &ApiMetrics {
        &self.api_metrics
    }

    /// Record a finished refresh
    pub fn record_refresh(&self, success: bool, duration: Duration) {
        let outcome = if success { "success" } else { "failure" };
        self.refresh_metrics
            .refreshes_total
            .with_label_values(&[outcome])
            .inc();
        self.refresh_metrics
            .refresh_duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Record a refresh result dropped as stale
    pub fn record_stale_discard(&self) {
        self.refresh_metrics.stale_discarded_total.inc();
    }

    /// Record a change notice from the store
    pub fn record_change_notice(&self, table: StoreTable) {
        self.refresh_metrics
            .change_notices_total
            .with_label_values(&[table.name()])
            .inc();
    }

    /// Record notices missed by a lagging subscription
    pub fn record_lagged_notices(&self, skipped: u64) {
        self.refresh_metrics.lagged_notices_total.inc_by(skipped);
    }

    /// Update gauges from a freshly published leaderboard
    pub fn update_from_leaderboard(&self, leaderboard: &Leaderboard) {
        self.refresh_metrics
            .leaderboard_generation
            .set(leaderboard.generation as i64);

        let boards = [
            ("br_teams", leaderboard.br_teams.len()),
            ("cs_teams", leaderboard.cs_teams.len()),
            ("br_players", leaderboard.br_players.len()),
            ("cs_players", leaderboard.cs_players.len()),
        ];
        for (board, entries) in boards {
            self.refresh_metrics
                .standings_entries
                .with_label_values(&[board])
                .set(entries as i64);
        }
    }

    /// Record an HTTP request
    pub fn record_http_request(&self, endpoint: &str, status: u16) {
        self.api_metrics
            .http_requests_total
            .with_label_values(&[endpoint, &status.to_string()])
            .inc();
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.api_metrics.health_status.set(status as i64);
    }
}

impl RefreshMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let refreshes_total = IntCounterVec::new(
            Opts::new(
                "points_table_refreshes_total",
                "Total leaderboard snapshot refreshes",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(refreshes_total.clone()))?;

        let refresh_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "points_table_refresh_duration_seconds",
                "Time to fetch and rank a full snapshot",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;
        registry.register(Box::new(refresh_duration_seconds.clone()))?;

        let stale_discarded_total = IntCounter::new(
            "points_table_stale_discarded_total",
            "Refresh results discarded because a newer snapshot was published",
        )?;
        registry.register(Box::new(stale_discarded_total.clone()))?;

        let change_notices_total = IntCounterVec::new(
            Opts::new(
                "points_table_change_notices_total",
                "Change notices received from the score store",
            ),
            &["table"],
        )?;
        registry.register(Box::new(change_notices_total.clone()))?;

        let lagged_notices_total = IntCounter::new(
            "points_table_lagged_notices_total",
            "Change notices skipped by a lagging subscription",
        )?;
        registry.register(Box::new(lagged_notices_total.clone()))?;

        let leaderboard_generation = IntGauge::new(
            "points_table_leaderboard_generation",
            "Generation of the published leaderboard",
        )?;
        registry.register(Box::new(leaderboard_generation.clone()))?;

        let standings_entries = IntGaugeVec::new(
            Opts::new(
                "points_table_standings_entries",
                "Entries on each published board",
            ),
            &["board"],
        )?;
        registry.register(Box::new(standings_entries.clone()))?;

        Ok(Self {
            refreshes_total,
            refresh_duration_seconds,
            stale_discarded_total,
            change_notices_total,
            lagged_notices_total,
            leaderboard_generation,
            standings_entries,
        })
    }
}

impl ApiMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let http_requests_total = IntCounterVec::new(
            Opts::new("points_table_http_requests_total", "Total HTTP requests"),
            &["endpoint", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let health_status = IntGauge::new(
            "points_table_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        Ok(Self {
            http_requests_total,
            health_status,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
