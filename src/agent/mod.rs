//! Agent launching interface and implementations
//!
//! A player's agent is an external program located by its artifact path.
//! Launching yields a move-producing handle the rules engine drives; the
//! transport behind that handle is an implementation detail of the
//! launcher.

pub mod ports;
pub mod process;

pub use ports::{PortPool, ReservedPort};
pub use process::{ProcessAgentLauncher, ProcessLaunchConfig};

use crate::error::ArenaError;
use crate::rules::GameState;
use crate::types::{Player, PlayerId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// A launched agent that produces moves for one game.
///
/// Agents receive the current state and reply with the successor state
/// after their move, as the move protocol defines.
#[async_trait]
pub trait MoveAgent: Send {
    /// The player this agent plays for.
    fn player_id(&self) -> &PlayerId;

    /// Produce the successor state for the agent's move.
    async fn propose_state(&mut self, state: &GameState) -> crate::error::Result<GameState>;
}

/// Trait for resolving a player to a launched, move-producing agent.
#[async_trait]
pub trait AgentLauncher: Send + Sync {
    /// Launch the player's agent artifact, drawing any communication
    /// endpoint it needs from the shared pool.
    async fn launch(
        &self,
        player: &Player,
        ports: &Arc<PortPool>,
    ) -> crate::error::Result<Box<dyn MoveAgent>>;
}

/// An in-process agent built from a closure. Used by mock launchers and
/// unit tests; no transport involved.
pub struct FnAgent {
    player_id: PlayerId,
    produce: Box<dyn FnMut(&GameState) -> crate::error::Result<GameState> + Send>,
}

impl FnAgent {
    pub fn new(
        player_id: PlayerId,
        produce: impl FnMut(&GameState) -> crate::error::Result<GameState> + Send + 'static,
    ) -> Self {
        Self {
            player_id,
            produce: Box::new(produce),
        }
    }
}

#[async_trait]
impl MoveAgent for FnAgent {
    fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    async fn propose_state(&mut self, state: &GameState) -> crate::error::Result<GameState> {
        (self.produce)(state)
    }
}

/// Factory producing a fresh agent per launch.
pub type AgentFactory = dyn Fn(PlayerId) -> Box<dyn MoveAgent> + Send + Sync;

/// Mock launcher for testing: hands out agents from registered factories
/// and can simulate launch failures per player.
#[derive(Default)]
pub struct MockAgentLauncher {
    factories: Mutex<HashMap<PlayerId, Box<AgentFactory>>>,
    failing: Mutex<HashSet<PlayerId>>,
    launches: Mutex<Vec<PlayerId>>,
}

impl MockAgentLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent factory for a player.
    pub fn register(
        &self,
        player_id: impl Into<PlayerId>,
        factory: impl Fn(PlayerId) -> Box<dyn MoveAgent> + Send + Sync + 'static,
    ) {
        if let Ok(mut factories) = self.factories.lock() {
            factories.insert(player_id.into(), Box::new(factory));
        }
    }

    /// Make every launch for this player fail.
    pub fn fail_launches_for(&self, player_id: impl Into<PlayerId>) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(player_id.into());
        }
    }

    /// All launches attempted so far (for assertions).
    pub fn launch_attempts(&self) -> Vec<PlayerId> {
        self.launches
            .lock()
            .map(|launches| launches.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AgentLauncher for MockAgentLauncher {
    async fn launch(
        &self,
        player: &Player,
        _ports: &Arc<PortPool>,
    ) -> crate::error::Result<Box<dyn MoveAgent>> {
        if let Ok(mut launches) = self.launches.lock() {
            launches.push(player.id.clone());
        }

        let failing = self
            .failing
            .lock()
            .map(|failing| failing.contains(&player.id))
            .unwrap_or(false);
        if failing {
            return Err(ArenaError::Launch {
                player_id: player.id.clone(),
                reason: "simulated launch failure".to_string(),
            }
            .into());
        }

        let factories = self.factories.lock().map_err(|_| ArenaError::Internal {
            message: "Failed to acquire factories lock".to_string(),
        })?;

        match factories.get(&player.id) {
            Some(factory) => Ok(factory(player.id.clone())),
            None => Err(ArenaError::Launch {
                player_id: player.id.clone(),
                reason: "no agent registered for player".to_string(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::current_timestamp;
    use std::path::PathBuf;

    fn test_player(id: &str) -> Player {
        Player {
            id: id.to_string(),
            display_name: id.to_string(),
            artifact_path: PathBuf::from(format!("{}/agent", id)),
            created_at: current_timestamp(),
        }
    }

    fn echo_factory(player_id: PlayerId) -> Box<dyn MoveAgent> {
        Box::new(FnAgent::new(player_id, |state| Ok(state.clone())))
    }

    #[tokio::test]
    async fn test_mock_launcher_hands_out_registered_agents() {
        let launcher = MockAgentLauncher::new();
        launcher.register("alpha", echo_factory);
        let ports = Arc::new(PortPool::new(42000, 42003));

        let mut agent = launcher
            .launch(&test_player("alpha"), &ports)
            .await
            .unwrap();
        assert_eq!(agent.player_id(), "alpha");

        let state = GameState(serde_json::json!({"pile": 7}));
        let next = agent.propose_state(&state).await.unwrap();
        assert_eq!(next, state);

        assert_eq!(launcher.launch_attempts(), vec!["alpha".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_launcher_unregistered_and_failing_players() {
        let launcher = MockAgentLauncher::new();
        launcher.register("beta", echo_factory);
        launcher.fail_launches_for("beta");
        let ports = Arc::new(PortPool::new(42000, 42003));

        // Registered but marked failing.
        assert!(launcher.launch(&test_player("beta"), &ports).await.is_err());

        // Never registered.
        assert!(launcher
            .launch(&test_player("gamma"), &ports)
            .await
            .is_err());
    }
}
