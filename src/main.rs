//! Main entry point for the Points Table standings service
//!
//! Loads configuration, starts the refresher and HTTP API, and shuts down
//! gracefully on SIGINT/SIGTERM.

use anyhow::Result;
use clap::Parser;
use points_table::config::{validate_config, AppConfig, StoreBackend};
use points_table::service::{AppState, HealthStatus};
use points_table::LeaderboardState;
use std::path::PathBuf;
use tokio::signal;
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{error, info, warn};

/// Points Table - Tournament standings for Battle Royale and Clash Squad
#[derive(Parser)]
#[command(
    name = "points-table",
    version,
    about = "Live tournament standings service for Battle Royale and Clash Squad",
    long_about = "Points Table ranks tournament teams and top fraggers from a score store, \
                 re-ranks the full snapshot whenever the store reports a change, and serves \
                 the leaderboard, health and Prometheus metrics over HTTP."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// HTTP port override
    #[arg(long, value_name = "PORT", help = "Override HTTP server port")]
    http_port: Option<u16>,

    /// Store backend override
    #[arg(
        long,
        value_name = "BACKEND",
        help = "Override score store backend (memory, rest)"
    )]
    backend: Option<StoreBackend>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Log the leaderboard health periodically
async fn health_log_task(leaderboard: watch::Receiver<LeaderboardState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(30));

    loop {
        interval.tick().await;

        let state = leaderboard.borrow().clone();
        let health = HealthStatus::from_leaderboard_state(&state);
        match state.leaderboard() {
            Some(board) => info!(
                "Health check: {} - generation {}, {} BR teams, {} CS teams",
                health,
                board.generation,
                board.br_teams.len(),
                board.cs_teams.len()
            ),
            None => warn!("Health check: {} - no leaderboard published yet", health),
        }
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("🏆 Points Table Standings Service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!(
        "   HTTP: {}:{}",
        config.service.http_host, config.service.http_port
    );
    info!("   Store backend: {}", config.store.backend);
    if config.store.backend == StoreBackend::Rest {
        info!("   Store URL: {}", config.store.base_url);
    }
    info!(
        "   Top players limit: {}",
        config.leaderboard.top_players_limit
    );
    match config.registration.deadline {
        Some(deadline) => info!("   Registration deadline: {}", deadline),
        None => info!("   Registration deadline: none"),
    }
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from file/environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(http_port) = args.http_port {
        config.service.http_port = http_port;
    }

    if let Some(backend) = args.backend {
        config.store.backend = backend;
    }

    validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Some(config_path) = &args.config {
        info!("Loaded configuration from: {}", config_path.display());
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    info!("Initializing service components...");
    let mut app_state = match AppState::new(config.clone()).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting service...");
    if let Err(e) = app_state.start().await {
        error!("Failed to start service: {}", e);
        std::process::exit(1);
    }

    let health_task = tokio::spawn(health_log_task(app_state.leaderboard()));

    info!("✅ Points Table standings service is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    wait_for_shutdown_signal().await;

    info!("🛑 Shutdown signal received, beginning graceful shutdown...");
    health_task.abort();

    if let Err(e) = app_state.shutdown().await {
        warn!("Shutdown completed with errors: {}", e);
    }

    info!("🛑 Points Table standings service stopped");
    Ok(())
}
