//! Metrics collection using Prometheus
//!
//! Counters and gauges for the arena's orchestration, game execution, and
//! rating activity, grouped per component over a single registry.

use crate::types::GameStatus;
use anyhow::Result;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;

/// Main metrics collector for the arena service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Match and game orchestration metrics
    match_metrics: MatchMetrics,

    /// Rating and matchmaking metrics
    rating_metrics: RatingMetrics,

    /// Service-level metrics
    service_metrics: ServiceMetrics,
}

/// Match and game orchestration metrics
#[derive(Clone)]
pub struct MatchMetrics {
    /// Total matches opened
    pub matches_started_total: IntCounter,

    /// Total games created and dispatched to runners
    pub games_dispatched_total: IntCounter,

    /// Total games reaching a terminal status, by status
    pub games_decided_total: IntCounterVec,

    /// Total dispatched game executions that failed
    pub game_failures_total: IntCounter,

    /// Total per-turn records persisted
    pub records_persisted_total: IntCounter,
}

/// Rating and matchmaking metrics
#[derive(Clone)]
pub struct RatingMetrics {
    /// Total full-history rating recomputations
    pub rating_runs_total: IntCounter,

    /// Players covered by the most recent ranking
    pub ranked_players: IntGauge,

    /// Total pairings proposed by the matchmaker
    pub pairings_proposed_total: IntCounter,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,
}

impl MetricsCollector {
    /// Create a new metrics collector with a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let match_metrics = MatchMetrics {
            matches_started_total: IntCounter::new(
                "arena_matches_started_total",
                "Total matches opened",
            )?,
            games_dispatched_total: IntCounter::new(
                "arena_games_dispatched_total",
                "Total games created and dispatched to runners",
            )?,
            games_decided_total: IntCounterVec::new(
                Opts::new(
                    "arena_games_decided_total",
                    "Total games reaching a terminal status",
                ),
                &["status"],
            )?,
            game_failures_total: IntCounter::new(
                "arena_game_failures_total",
                "Total dispatched game executions that failed",
            )?,
            records_persisted_total: IntCounter::new(
                "arena_records_persisted_total",
                "Total per-turn records persisted",
            )?,
        };

        let rating_metrics = RatingMetrics {
            rating_runs_total: IntCounter::new(
                "arena_rating_runs_total",
                "Total full-history rating recomputations",
            )?,
            ranked_players: IntGauge::new(
                "arena_ranked_players",
                "Players covered by the most recent ranking",
            )?,
            pairings_proposed_total: IntCounter::new(
                "arena_pairings_proposed_total",
                "Total pairings proposed by the matchmaker",
            )?,
        };

        let service_metrics = ServiceMetrics {
            uptime_seconds: IntGauge::new("arena_uptime_seconds", "Service uptime in seconds")?,
            health_status: IntGauge::new(
                "arena_health_status",
                "Health check status (0=unhealthy, 1=degraded, 2=healthy)",
            )?,
        };

        registry.register(Box::new(match_metrics.matches_started_total.clone()))?;
        registry.register(Box::new(match_metrics.games_dispatched_total.clone()))?;
        registry.register(Box::new(match_metrics.games_decided_total.clone()))?;
        registry.register(Box::new(match_metrics.game_failures_total.clone()))?;
        registry.register(Box::new(match_metrics.records_persisted_total.clone()))?;
        registry.register(Box::new(rating_metrics.rating_runs_total.clone()))?;
        registry.register(Box::new(rating_metrics.ranked_players.clone()))?;
        registry.register(Box::new(rating_metrics.pairings_proposed_total.clone()))?;
        registry.register(Box::new(service_metrics.uptime_seconds.clone()))?;
        registry.register(Box::new(service_metrics.health_status.clone()))?;

        Ok(Self {
            registry,
            match_metrics,
            rating_metrics,
            service_metrics,
        })
    }

    /// Get the Prometheus registry for metric export
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Direct access to match metrics
    pub fn matches(&self) -> &MatchMetrics {
        &self.match_metrics
    }

    /// Direct access to rating metrics
    pub fn rating(&self) -> &RatingMetrics {
        &self.rating_metrics
    }

    /// Direct access to service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Record a newly opened match
    pub fn record_match_started(&self) {
        self.match_metrics.matches_started_total.inc();
    }

    /// Record a game created and handed to a runner
    pub fn record_game_dispatched(&self) {
        self.match_metrics.games_dispatched_total.inc();
    }

    /// Record a game reaching a terminal status
    pub fn record_game_decided(&self, status: GameStatus) {
        let status_label = status.to_string();
        self.match_metrics
            .games_decided_total
            .with_label_values(&[status_label.as_str()])
            .inc();
    }

    /// Record a dispatched game execution failing
    pub fn record_game_failed(&self) {
        self.match_metrics.game_failures_total.inc();
    }

    /// Record one per-turn record write
    pub fn record_turn_persisted(&self) {
        self.match_metrics.records_persisted_total.inc();
    }

    /// Record a rating recomputation covering `ranked` players
    pub fn record_rating_run(&self, ranked: usize) {
        self.rating_metrics.rating_runs_total.inc();
        self.rating_metrics.ranked_players.set(ranked as i64);
    }

    /// Record a proposed pairing
    pub fn record_pairing_proposed(&self) {
        self.rating_metrics.pairings_proposed_total.inc();
    }
}
