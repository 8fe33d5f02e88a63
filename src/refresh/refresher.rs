//! Observer loop that keeps the published leaderboard in sync with the store
//!
//! Every change notice triggers a full snapshot fetch followed by a pure
//! re-rank. Notices carry no deltas, so a lagged subscription is handled the
//! same way as a single notice. Results are published through a `watch`
//! channel guarded by a generation counter: a result older than the one
//! already published is discarded.

use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::refresh::snapshot::{Leaderboard, LeaderboardState, StoreSnapshot};
use crate::store::ScoreStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

/// Default number of players on each top-players board
pub const DEFAULT_TOP_PLAYERS_LIMIT: usize = 15;

/// What happened to a completed refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Published { generation: u64 },
    /// A newer generation had already been published
    Discarded { generation: u64 },
}

impl RefreshOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            RefreshOutcome::Published { generation } | RefreshOutcome::Discarded { generation } => {
                *generation
            }
        }
    }
}

/// Fetches, ranks and publishes leaderboard snapshots
pub struct StandingsRefresher {
    store: Arc<dyn ScoreStore>,
    top_players_limit: usize,
    state_tx: watch::Sender<LeaderboardState>,
    generation: AtomicU64,
    metrics: Option<Arc<MetricsCollector>>,
}

impl StandingsRefresher {
    /// Create a refresher in the `Loading` state
    pub fn new(store: Arc<dyn ScoreStore>, top_players_limit: usize) -> Self {
        let (state_tx, _) = watch::channel(LeaderboardState::Loading);
        Self {
            store,
            top_players_limit,
            state_tx,
            generation: AtomicU64::new(0),
            metrics: None,
        }
    }

    /// Record refresh metrics into the given collector
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Observe published leaderboard states
    pub fn subscribe(&self) -> watch::Receiver<LeaderboardState> {
        self.state_tx.subscribe()
    }

    /// Currently published state
    pub fn current(&self) -> LeaderboardState {
        self.state_tx.borrow().clone()
    }

    pub fn top_players_limit(&self) -> usize {
        self.top_players_limit
    }

    /// Fetch a full snapshot, rank it and publish the result
    ///
    /// A failed fetch publishes `Failed` with the last good leaderboard and
    /// returns the error.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();

        let built = match StoreSnapshot::fetch(self.store.as_ref(), self.top_players_limit).await {
            Ok(snapshot) => Leaderboard::build(snapshot, generation, self.top_players_limit),
            Err(e) => Err(e),
        };
        let elapsed = started.elapsed();

        if let Some(metrics) = &self.metrics {
            metrics.record_refresh(built.is_ok(), elapsed);
        }

        match built {
            Ok(leaderboard) => {
                let entries = leaderboard.br_teams.len() + leaderboard.cs_teams.len();
                let outcome = self.publish(generation, Ok(leaderboard));
                match outcome {
                    RefreshOutcome::Published { .. } => debug!(
                        "Published leaderboard generation {} ({} team entries, {:.2}ms)",
                        generation,
                        entries,
                        elapsed.as_secs_f64() * 1000.0
                    ),
                    RefreshOutcome::Discarded { .. } => debug!(
                        "Discarded stale leaderboard generation {}",
                        generation
                    ),
                }
                Ok(outcome)
            }
            Err(e) => {
                error!("Leaderboard refresh {} failed: {}", generation, e);
                self.publish(generation, Err(e.to_string()));
                Err(e)
            }
        }
    }

    fn publish(&self, generation: u64, result: std::result::Result<Leaderboard, String>) -> RefreshOutcome {
        let mut published: Option<Leaderboard> = None;

        let modified = self.state_tx.send_if_modified(|state| {
            if state.generation() >= generation {
                return false;
            }
            *state = match &result {
                Ok(leaderboard) => {
                    published = Some(leaderboard.clone());
                    LeaderboardState::Ready {
                        leaderboard: leaderboard.clone(),
                    }
                }
                Err(message) => LeaderboardState::Failed {
                    generation,
                    message: message.clone(),
                    last_good: state.leaderboard().cloned(),
                },
            };
            true
        });

        if !modified {
            if let Some(metrics) = &self.metrics {
                metrics.record_stale_discard();
            }
            return RefreshOutcome::Discarded { generation };
        }

        if let (Some(metrics), Some(leaderboard)) = (&self.metrics, &published) {
            metrics.update_from_leaderboard(leaderboard);
        }
        RefreshOutcome::Published { generation }
    }

    /// Initial load, then one refresh per change notice until shutdown
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        // Subscribe before the initial load so no change is missed in between
        let mut notices = self.store.subscribe().into_stream();

        info!("Standings refresher started");
        if let Err(e) = self.refresh().await {
            warn!("Initial leaderboard load failed: {}", e);
        }

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Standings refresher received shutdown signal");
                    break;
                }
                notice = notices.next() => {
                    match notice {
                        Some(Ok(notice)) => {
                            debug!("Change notice for {}", notice.table.name());
                            if let Some(metrics) = &self.metrics {
                                metrics.record_change_notice(notice.table);
                            }
                        }
                        Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                            warn!("Refresher lagged behind by {} change notices", skipped);
                            if let Some(metrics) = &self.metrics {
                                metrics.record_lagged_notices(skipped);
                            }
                        }
                        None => {
                            warn!("Change feed closed, stopping refresher");
                            break;
                        }
                    }

                    // Failures are already published as state
                    let _ = self.refresh().await;
                }
            }
        }

        info!("Standings refresher stopped");
    }

    /// Run the refresher on its own task
    pub fn spawn(self: Arc<Self>, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(shutdown).await })
    }
}
