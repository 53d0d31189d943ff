//! Main application state and service coordination
//!
//! Wires the store, rules engine, agent launcher, rating engine,
//! matchmaker, and orchestrator together, and runs the ladder loop that
//! periodically rates history, proposes a pairing, and opens a match.

use crate::agent::{AgentLauncher, PortPool, ProcessAgentLauncher, ProcessLaunchConfig};
use crate::config::AppConfig;
use crate::matchmaking::{PairingStrategy, UncertaintyMatchmaker};
use crate::metrics::MetricsCollector;
use crate::orchestrator::{GameRunner, MatchOrchestrator};
use crate::rating::{RatingEngine, TrueSkillModel};
use crate::rules::{NimRules, RulesEngine};
use crate::service::health::ServiceStats;
use crate::store::{GameStore, InMemoryStore};
use crate::types::{Match, Player, PlayerId, Ranking};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::{debug, error, info};

/// Application state coordinating all arena components.
pub struct AppState {
    config: AppConfig,
    store: Arc<dyn GameStore>,
    rating_engine: Arc<RatingEngine>,
    matchmaker: Arc<dyn PairingStrategy>,
    orchestrator: Arc<MatchOrchestrator>,
    metrics: Arc<MetricsCollector>,
    started_at: DateTime<Utc>,
    running: Arc<RwLock<bool>>,
}

impl AppState {
    /// Create application state with the default wiring: in-memory store,
    /// Nim rules engine, and process-backed agent launcher.
    pub async fn new(config: AppConfig) -> crate::error::Result<Self> {
        let store: Arc<dyn GameStore> = Arc::new(InMemoryStore::new());
        let rules: Arc<dyn RulesEngine> = Arc::new(NimRules::default());
        let launcher: Arc<dyn AgentLauncher> =
            Arc::new(ProcessAgentLauncher::new(ProcessLaunchConfig {
                artifact_root: config.agents.artifact_root.clone(),
                connect_timeout: config.agent_connect_timeout(),
            }));

        Self::with_components(config, store, rules, launcher).await
    }

    /// Create application state over custom store, rules engine, and
    /// launcher implementations.
    pub async fn with_components(
        config: AppConfig,
        store: Arc<dyn GameStore>,
        rules: Arc<dyn RulesEngine>,
        launcher: Arc<dyn AgentLauncher>,
    ) -> crate::error::Result<Self> {
        let metrics = Arc::new(MetricsCollector::new()?);

        let ports = Arc::new(PortPool::new(
            config.agents.port_range_start,
            config.agents.port_range_end,
        ));

        let runner = Arc::new(GameRunner::new(
            Arc::clone(&store),
            rules,
            launcher,
            ports,
            config.ladder.move_limit,
            Arc::clone(&metrics),
        ));

        let orchestrator = Arc::new(MatchOrchestrator::new(
            Arc::clone(&store),
            runner,
            Arc::clone(&metrics),
        ));

        let model = Arc::new(TrueSkillModel::new(&config.rating)?);
        let rating_engine = Arc::new(RatingEngine::new(model, &config.rating));

        let state = Self {
            config,
            store,
            rating_engine,
            matchmaker: Arc::new(UncertaintyMatchmaker::new()),
            orchestrator,
            metrics,
            started_at: current_timestamp(),
            running: Arc::new(RwLock::new(false)),
        };

        state.register_roster().await?;
        Ok(state)
    }

    /// Register every roster entry from the configuration as a player.
    async fn register_roster(&self) -> crate::error::Result<()> {
        for entry in &self.config.ladder.roster {
            let player = Player {
                id: entry.id.clone(),
                display_name: entry
                    .display_name
                    .clone()
                    .unwrap_or_else(|| entry.id.clone()),
                artifact_path: entry.artifact.clone(),
                created_at: current_timestamp(),
            };
            self.store.create_player(player).await?;
            info!("Registered roster player '{}'", entry.id);
        }
        Ok(())
    }

    /// Run one ladder round: rate the full history, propose a pairing, and
    /// open a match for it. Returns the opened match, or `None` when fewer
    /// than two players are registered.
    pub async fn run_round(&self) -> crate::error::Result<Option<Match>> {
        let players = self.store.list_players().await?;
        if players.len() < 2 {
            debug!(
                "Skipping ladder round: {} registered player(s)",
                players.len()
            );
            return Ok(None);
        }

        let roster: Vec<PlayerId> = players.iter().map(|p| p.id.clone()).collect();
        let results = self.store.decided_results().await?;

        let rankings = self.rating_engine.rate_games(&roster, &results)?;
        self.metrics.record_rating_run(rankings.len());

        let (first, second) = self.matchmaker.propose_pairing(&rankings)?;
        self.metrics.record_pairing_proposed();

        info!(
            "Ladder round: {} decided result(s), next pairing '{}' vs '{}'",
            results.len(),
            first,
            second
        );

        let contest = self.orchestrator.run(&first, &second).await?;
        Ok(Some(contest))
    }

    /// Start the periodic ladder loop.
    pub fn start_ladder_loop(self: Arc<Self>) {
        let state = Arc::clone(&self);

        tokio::spawn(async move {
            let mut ticker = interval(state.config.round_interval());

            loop {
                ticker.tick().await;

                if !state.is_running().await {
                    info!("Ladder loop stopping");
                    break;
                }

                match state.run_round().await {
                    Ok(Some(contest)) => {
                        debug!("Ladder round opened match {}", contest.id);
                    }
                    Ok(None) => {}
                    Err(err) => {
                        error!("Ladder round failed: {:#}", err);
                    }
                }
            }
        });

        info!("Started ladder loop");
    }

    /// Mark the service as running.
    pub async fn start(&self) {
        *self.running.write().await = true;
    }

    /// Mark the service as stopped; the ladder loop exits on its next tick.
    pub async fn stop(&self) {
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn GameStore> {
        Arc::clone(&self.store)
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        Arc::clone(&self.metrics)
    }

    /// Current rankings over the full decided-game history.
    pub async fn current_rankings(&self) -> crate::error::Result<Vec<Ranking>> {
        let players = self.store.list_players().await?;
        let roster: Vec<PlayerId> = players.iter().map(|p| p.id.clone()).collect();
        let results = self.store.decided_results().await?;
        self.rating_engine.rate_games(&roster, &results)
    }

    /// Aggregate counts for health reporting.
    pub async fn stats(&self) -> crate::error::Result<ServiceStats> {
        let players = self.store.list_players().await?;
        let matches = self.store.list_matches().await?;
        let games = self.store.list_games().await?;

        let games_decided = games.iter().filter(|g| g.status.is_terminal()).count();
        let games_scheduled = games.len() - games_decided;

        let uptime = current_timestamp().signed_duration_since(self.started_at);

        Ok(ServiceStats {
            registered_players: players.len(),
            matches_opened: matches.len(),
            games_total: games.len(),
            games_decided,
            games_scheduled,
            uptime_info: format!("{}s", uptime.num_seconds()),
        })
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
