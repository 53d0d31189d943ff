//! Shared fixtures for integration tests
//!
//! Scripted Nim agents of varying strength plus a helper that assembles a
//! complete arena system over the in-memory store and mock launcher.

use agent_arena::agent::{AgentLauncher, FnAgent, MockAgentLauncher, MoveAgent, PortPool};
use agent_arena::metrics::MetricsCollector;
use agent_arena::orchestrator::{GameExecutor, GameRunner, MatchOrchestrator};
use agent_arena::rules::nim::NimState;
use agent_arena::rules::NimRules;
use agent_arena::store::{GameStore, InMemoryStore};
use agent_arena::types::{Player, PlayerId};
use agent_arena::utils::current_timestamp;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// A scripted agent that always takes one token.
pub fn take_one_factory(player_id: PlayerId) -> Box<dyn MoveAgent> {
    Box::new(FnAgent::new(player_id, |state| {
        let current = NimState::decode(state).unwrap();
        Ok(NimState {
            pile: current.pile - 1,
            to_move: current.to_move.opposite(),
        }
        .encode())
    }))
}

/// A scripted agent playing perfect Nim: leave the opponent a multiple of
/// four, or take one token from a lost position.
pub fn optimal_factory(player_id: PlayerId) -> Box<dyn MoveAgent> {
    Box::new(FnAgent::new(player_id, |state| {
        let current = NimState::decode(state).unwrap();
        let take = match current.pile % 4 {
            0 => 1,
            remainder => remainder,
        };
        Ok(NimState {
            pile: current.pile - take,
            to_move: current.to_move.opposite(),
        }
        .encode())
    }))
}

/// A complete arena over the in-memory store with scripted agents.
pub struct TestArena {
    pub store: Arc<InMemoryStore>,
    pub launcher: Arc<MockAgentLauncher>,
    pub orchestrator: Arc<MatchOrchestrator>,
    pub metrics: Arc<MetricsCollector>,
}

impl TestArena {
    /// Build an arena playing Nim from the given starting pile.
    pub fn new(start_pile: u32) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let launcher = Arc::new(MockAgentLauncher::new());
        let metrics = Arc::new(MetricsCollector::new().unwrap());

        let runner = Arc::new(GameRunner::new(
            Arc::clone(&store) as Arc<dyn GameStore>,
            Arc::new(NimRules::new(start_pile)),
            Arc::clone(&launcher) as Arc<dyn AgentLauncher>,
            Arc::new(PortPool::new(42000, 42063)),
            200,
            Arc::clone(&metrics),
        ));

        let orchestrator = Arc::new(MatchOrchestrator::new(
            Arc::clone(&store) as Arc<dyn GameStore>,
            runner as Arc<dyn GameExecutor>,
            Arc::clone(&metrics),
        ));

        Self {
            store,
            launcher,
            orchestrator,
            metrics,
        }
    }

    /// Register a player and wire its scripted agent into the launcher.
    pub async fn register(
        &self,
        id: &str,
        factory: impl Fn(PlayerId) -> Box<dyn MoveAgent> + Send + Sync + 'static,
    ) {
        self.store
            .create_player(Player {
                id: id.to_string(),
                display_name: id.to_string(),
                artifact_path: PathBuf::from(format!("{}/agent", id)),
                created_at: current_timestamp(),
            })
            .await
            .unwrap();
        self.launcher.register(id.to_string(), factory);
    }

    /// Wait until `predicate` holds over the store, or panic after ~2s.
    pub async fn wait_until<F, Fut>(&self, what: &str, predicate: F)
    where
        F: Fn(Arc<InMemoryStore>) -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        for _ in 0..200 {
            if predicate(Arc::clone(&self.store)).await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for: {}", what);
    }
}
