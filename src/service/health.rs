//! Health check logic and monitoring
//!
//! Component-level health checks over the application state, including the
//! operator-facing audit signal for games stuck in `Scheduled` status.

use crate::service::app::AppState;
use crate::types::GameStatus;
use crate::utils::current_timestamp;
use anyhow::Result;
use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A scheduled game older than this is considered stuck: its execution
/// either hung or failed without a terminal status.
const STUCK_GAME_AGE_SECONDS: i64 = 600;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional detail message
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Number of registered players
    pub registered_players: usize,
    /// Matches opened since service start
    pub matches_opened: usize,
    /// Total games created
    pub games_total: usize,
    /// Games with a terminal status
    pub games_decided: usize,
    /// Games still scheduled
    pub games_scheduled: usize,
    /// Service uptime information
    pub uptime_info: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    /// Service statistics
    pub stats: ServiceStats,
}

impl HealthCheck {
    /// Perform a comprehensive health check of the service
    pub async fn check(app_state: Arc<AppState>) -> Result<Self> {
        let mut checks = Vec::new();

        checks.push(Self::check_storage(&app_state).await);
        checks.push(Self::check_ladder_loop(&app_state).await);
        checks.push(Self::check_stuck_games(&app_state).await);

        let status = if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else if checks.iter().any(|c| c.status == HealthStatus::Degraded) {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        let stats = app_state.stats().await?;

        Ok(Self {
            status,
            service: app_state.config().service.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: current_timestamp(),
            checks,
            stats,
        })
    }

    /// Lightweight liveness probe: is the service loop alive?
    pub async fn liveness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if app_state.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    /// Readiness probe: is storage reachable?
    pub async fn readiness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        match app_state.store().list_players().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(err) => {
                debug!("Readiness check failed: {}", err);
                Ok(HealthStatus::Unhealthy)
            }
        }
    }

    async fn check_storage(app_state: &Arc<AppState>) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match app_state.store().list_players().await {
            Ok(players) => (
                HealthStatus::Healthy,
                Some(format!("{} registered player(s)", players.len())),
            ),
            Err(err) => (HealthStatus::Unhealthy, Some(err.to_string())),
        };

        ComponentCheck {
            name: "storage".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn check_ladder_loop(app_state: &Arc<AppState>) -> ComponentCheck {
        let start = std::time::Instant::now();

        let status = if app_state.is_running().await {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };

        ComponentCheck {
            name: "ladder-loop".to_string(),
            status,
            message: None,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Count scheduled games old enough that their execution must have
    /// hung or failed; failures of dispatched executions are only ever
    /// observable this way.
    async fn check_stuck_games(app_state: &Arc<AppState>) -> ComponentCheck {
        let start = std::time::Instant::now();
        let threshold = current_timestamp() - ChronoDuration::seconds(STUCK_GAME_AGE_SECONDS);

        let (status, message) = match app_state.store().list_games().await {
            Ok(games) => {
                let stuck = games
                    .iter()
                    .filter(|g| g.status == GameStatus::Scheduled && g.created_at < threshold)
                    .count();
                if stuck == 0 {
                    (HealthStatus::Healthy, None)
                } else {
                    (
                        HealthStatus::Degraded,
                        Some(format!("{} game(s) stuck in scheduled status", stuck)),
                    )
                }
            }
            Err(err) => (HealthStatus::Unhealthy, Some(err.to_string())),
        };

        ComponentCheck {
            name: "stuck-games".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }
}
