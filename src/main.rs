//! Main entry point for the Agent Arena service
//!
//! This is the production entry point that initializes and runs the arena
//! ladder service with proper error handling, logging, and graceful
//! shutdown.

use agent_arena::config::AppConfig;
use agent_arena::metrics::{HealthServer, HealthServerConfig};
use agent_arena::service::{AppState, HealthCheck, HealthStatus};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

/// Agent Arena - match orchestration and rating for AI-agent ladders
#[derive(Parser)]
#[command(
    name = "agent-arena",
    version,
    about = "A match orchestration and rating service for AI-agent game ladders",
    long_about = "Agent Arena runs automated matches between AI agents playing a two-player \
                 abstract strategy game, tracks each agent's skill rating with a TrueSkill \
                 model, and decides which pairing should be played next."
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

    /// Perform health check and exit
    #[arg(long, help = "Perform a health check and exit with status code")]
    health_check: bool,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Health port override
    #[arg(long, value_name = "PORT", help = "Override health server port")]
    health_port: Option<u16>,

    /// Round interval override
    #[arg(
        long,
        value_name = "SECONDS",
        help = "Override seconds between ladder rounds"
    )]
    round_interval: Option<u64>,

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

/// Perform health check and return appropriate exit code
async fn perform_health_check(config: AppConfig) -> Result<()> {
    info!("Performing health check...");

    let app_state = Arc::new(AppState::new(config).await?);
    app_state.start().await;

    match HealthCheck::check(app_state).await {
        Ok(health) => {
            println!("Health Check: {}", health.status);
            println!("  Registered Players: {}", health.stats.registered_players);
            println!("  Matches Opened: {}", health.stats.matches_opened);
            println!("  Games Decided: {}", health.stats.games_decided);
            println!("  Games Scheduled: {}", health.stats.games_scheduled);
            println!("  Uptime: {}", health.stats.uptime_info);

            if health.status == HealthStatus::Healthy {
                std::process::exit(0);
            } else {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            std::process::exit(1);
        }
    }
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

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("Agent Arena");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Health port: {}", config.service.health_port);
    info!(
        "   Artifact root: {}",
        config.agents.artifact_root.display()
    );
    info!(
        "   Agent ports: {}-{}",
        config.agents.port_range_start, config.agents.port_range_end
    );
    info!("   Roster size: {}", config.ladder.roster.len());
    info!(
        "   Round interval: {}s",
        config.ladder.round_interval_seconds
    );
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
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

    if let Some(health_port) = args.health_port {
        config.service.health_port = health_port;
    }

    if let Some(round_interval) = args.round_interval {
        config.ladder.round_interval_seconds = round_interval;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    // Handle special modes
    if args.health_check {
        return perform_health_check(config).await;
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    // Display startup information
    display_startup_banner(&config);

    // Initialize application state
    info!("Initializing service components...");
    let app_state = match AppState::new(config.clone()).await {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    // Start the ladder loop
    app_state.start().await;
    Arc::clone(&app_state).start_ladder_loop();

    // Start the health/metrics server
    let health_server = Arc::new(
        HealthServer::new(
            HealthServerConfig {
                port: config.service.health_port,
                ..HealthServerConfig::default()
            },
            app_state.metrics(),
        )
        .with_app_state(Arc::clone(&app_state)),
    );

    let health_server_task = {
        let health_server = Arc::clone(&health_server);
        tokio::spawn(async move {
            if let Err(e) = health_server.start().await {
                error!("Health server error: {}", e);
            }
        })
    };

    info!("Agent Arena is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    // Wait for shutdown signal
    wait_for_shutdown_signal().await;

    // Begin graceful shutdown
    info!("Shutdown signal received, beginning graceful shutdown...");

    app_state.stop().await;
    if let Err(e) = health_server.stop().await {
        warn!("Failed to stop health server cleanly: {}", e);
    }

    // Shutdown with timeout; in-flight game executions are fire-and-forget
    // and stop with the process.
    let shutdown_timeout = config.shutdown_timeout();
    let shutdown_future = async {
        let _ = health_server_task.await;
        sleep(Duration::from_millis(100)).await;
    };

    match tokio::time::timeout(shutdown_timeout, shutdown_future).await {
        Ok(()) => {
            info!("Graceful shutdown completed successfully");
        }
        Err(_) => {
            warn!("Shutdown timeout exceeded, forcing exit");
        }
    }

    info!("Agent Arena stopped");
    Ok(())
}
