//! Metrics for the standings service
//!
//! This module provides Prometheus metrics for snapshot refreshes, change
//! notifications and the HTTP API.

pub mod collector;

pub use collector::{ApiMetrics, MetricsCollector, RefreshMetrics};
