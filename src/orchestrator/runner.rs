//! Game runner: drives one game to completion
//!
//! The runner resolves both participants to launched agents, hands them to
//! the rules engine, persists a record for every observed state transition,
//! and performs the single status update when the engine reports a
//! terminal verdict.

use crate::agent::{AgentLauncher, PortPool};
use crate::error::ArenaError;
use crate::metrics::MetricsCollector;
use crate::rules::{GameState, PlayConfig, RulesEngine, StateObserver};
use crate::store::GameStore;
use crate::types::{Game, GameId, GameStatus, Outcome, Record};
use crate::utils::current_timestamp;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Trait for executing one scheduled game to completion.
#[async_trait]
pub trait GameExecutor: Send + Sync {
    async fn run(&self, game: &Game) -> crate::error::Result<()>;
}

/// Observer that persists every state transition as a record.
///
/// Turn numbering is derived from the stored count, not an internal
/// counter: the store is the single authority for persistence cadence.
struct RecordObserver {
    store: Arc<dyn GameStore>,
    game_id: GameId,
    metrics: Arc<MetricsCollector>,
}

#[async_trait]
impl StateObserver for RecordObserver {
    async fn observe(&mut self, state: &GameState) -> crate::error::Result<()> {
        let count = self.store.record_count(self.game_id).await?;

        let record = Record {
            game_id: self.game_id,
            turn_num: count + 1,
            state: state.to_json()?,
            recorded_at: current_timestamp(),
        };

        self.store.append_record(record).await?;
        self.metrics.record_turn_persisted();
        Ok(())
    }
}

/// Runs a single game: launch both agents, drive the rules engine, record
/// every turn, finalize the game row exactly once.
pub struct GameRunner {
    store: Arc<dyn GameStore>,
    rules: Arc<dyn RulesEngine>,
    launcher: Arc<dyn AgentLauncher>,
    ports: Arc<PortPool>,
    move_limit: u32,
    metrics: Arc<MetricsCollector>,
}

impl GameRunner {
    pub fn new(
        store: Arc<dyn GameStore>,
        rules: Arc<dyn RulesEngine>,
        launcher: Arc<dyn AgentLauncher>,
        ports: Arc<PortPool>,
        move_limit: u32,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            store,
            rules,
            launcher,
            ports,
            move_limit,
            metrics,
        }
    }
}

#[async_trait]
impl GameExecutor for GameRunner {
    async fn run(&self, game: &Game) -> crate::error::Result<()> {
        info!(
            "Running game {} - white: '{}', black: '{}'",
            game.id, game.seats.white, game.seats.black
        );

        // Resolve and launch both participants before touching the game row;
        // a failure here leaves the game untouched and Scheduled.
        let white = self.store.player(&game.seats.white).await?;
        let black = self.store.player(&game.seats.black).await?;

        let white_agent = self.launcher.launch(&white, &self.ports).await?;
        let black_agent = self.launcher.launch(&black, &self.ports).await?;

        let mut observer = RecordObserver {
            store: Arc::clone(&self.store),
            game_id: game.id,
            metrics: Arc::clone(&self.metrics),
        };

        let verdict = self
            .rules
            .execute_game(
                white_agent,
                black_agent,
                PlayConfig {
                    start: self.rules.standard_start(),
                    move_limit: self.move_limit,
                },
                &mut observer,
            )
            .await?;

        let status = match verdict.outcome {
            Outcome::WhiteWins => GameStatus::WhiteWins,
            Outcome::BlackWins => GameStatus::BlackWins,
            Outcome::Tie => GameStatus::Draw,
            outcome => return Err(ArenaError::UnmappedOutcome { outcome }.into()),
        };

        self.store
            .finalize_game(game.id, status, verdict.reason.clone())
            .await?;
        self.metrics.record_game_decided(status);

        info!(
            "Game {} decided: {} ({})",
            game.id, status, verdict.reason
        );
        Ok(())
    }
}

/// Mock executor for testing dispatch logic: records the games it was
/// handed and can be told to fail every run.
#[derive(Default)]
pub struct MockGameExecutor {
    executed: Mutex<Vec<Game>>,
    fail_runs: Mutex<bool>,
}

impl MockGameExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every run fail after being recorded.
    pub fn fail_all_runs(&self) {
        if let Ok(mut flag) = self.fail_runs.lock() {
            *flag = true;
        }
    }

    /// All games handed to this executor so far.
    pub fn executed_games(&self) -> Vec<Game> {
        self.executed
            .lock()
            .map(|games| games.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GameExecutor for MockGameExecutor {
    async fn run(&self, game: &Game) -> crate::error::Result<()> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(game.clone());
        }

        let failing = self.fail_runs.lock().map(|flag| *flag).unwrap_or(false);
        if failing {
            return Err(ArenaError::Internal {
                message: "simulated execution failure".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{FnAgent, MockAgentLauncher, MoveAgent};
    use crate::rules::nim::{NimRules, NimState};
    use crate::rules::GameVerdict;
    use crate::store::{FlakyStore, InMemoryStore};
    use crate::types::{Player, PlayerId, Seats};
    use crate::utils::generate_game_id;
    use std::path::PathBuf;

    fn test_player(id: &str) -> Player {
        Player {
            id: id.to_string(),
            display_name: id.to_string(),
            artifact_path: PathBuf::from(format!("{}/agent", id)),
            created_at: current_timestamp(),
        }
    }

    fn scheduled_game(white: &str, black: &str) -> Game {
        Game {
            id: generate_game_id(),
            match_id: uuid::Uuid::new_v4(),
            seats: Seats {
                white: white.to_string(),
                black: black.to_string(),
            },
            status: GameStatus::Scheduled,
            reason: None,
            created_at: current_timestamp(),
            decided_at: None,
        }
    }

    fn take_one_factory(player_id: PlayerId) -> Box<dyn MoveAgent> {
        Box::new(FnAgent::new(player_id, |state| {
            let current = NimState::decode(state).unwrap();
            Ok(NimState {
                pile: current.pile - 1,
                to_move: current.to_move.opposite(),
            }
            .encode())
        }))
    }

    async fn seeded_store(store: &dyn GameStore, white: &str, black: &str) -> Game {
        store.create_player(test_player(white)).await.unwrap();
        store.create_player(test_player(black)).await.unwrap();
        store
            .create_game(scheduled_game(white, black))
            .await
            .unwrap()
    }

    fn runner_with(
        store: Arc<dyn GameStore>,
        rules: Arc<dyn RulesEngine>,
        launcher: Arc<dyn AgentLauncher>,
    ) -> GameRunner {
        GameRunner::new(
            store,
            rules,
            launcher,
            Arc::new(PortPool::new(42000, 42031)),
            100,
            Arc::new(MetricsCollector::new().unwrap()),
        )
    }

    #[tokio::test]
    async fn test_runs_game_to_completion_with_records() {
        let store: Arc<dyn GameStore> = Arc::new(InMemoryStore::new());
        let game = seeded_store(store.as_ref(), "alpha", "beta").await;

        let launcher = MockAgentLauncher::new();
        launcher.register("alpha", take_one_factory);
        launcher.register("beta", take_one_factory);

        let runner = runner_with(
            Arc::clone(&store),
            Arc::new(NimRules::new(5)),
            Arc::new(launcher),
        );

        runner.run(&game).await.unwrap();

        // Odd pile, both take one: white takes the last token.
        let decided = store.game(game.id).await.unwrap();
        assert_eq!(decided.status, GameStatus::WhiteWins);
        assert_eq!(decided.reason.as_deref(), Some("took the last token"));
        assert!(decided.decided_at.is_some());

        // Five transitions, numbered 1..=5 with no gaps.
        let records = store.records_for_game(game.id).await.unwrap();
        assert_eq!(
            records.iter().map(|r| r.turn_num).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
    }

    #[tokio::test]
    async fn test_launch_failure_aborts_before_any_mutation() {
        let store: Arc<dyn GameStore> = Arc::new(InMemoryStore::new());
        let game = seeded_store(store.as_ref(), "alpha", "beta").await;

        let launcher = MockAgentLauncher::new();
        launcher.register("alpha", take_one_factory);
        launcher.register("beta", take_one_factory);
        launcher.fail_launches_for("beta");

        let runner = runner_with(
            Arc::clone(&store),
            Arc::new(NimRules::new(5)),
            Arc::new(launcher),
        );

        assert!(runner.run(&game).await.is_err());

        // No records, still scheduled.
        assert_eq!(store.record_count(game.id).await.unwrap(), 0);
        let stored = store.game(game.id).await.unwrap();
        assert_eq!(stored.status, GameStatus::Scheduled);
        assert!(stored.reason.is_none());
    }

    #[tokio::test]
    async fn test_unknown_player_aborts_before_launch() {
        let store: Arc<dyn GameStore> = Arc::new(InMemoryStore::new());
        store.create_player(test_player("alpha")).await.unwrap();
        let game = store
            .create_game(scheduled_game("alpha", "ghost"))
            .await
            .unwrap();

        let launcher = Arc::new(MockAgentLauncher::new());
        launcher.register("alpha", take_one_factory);

        let runner = runner_with(
            Arc::clone(&store),
            Arc::new(NimRules::new(5)),
            Arc::clone(&launcher) as Arc<dyn AgentLauncher>,
        );

        assert!(runner.run(&game).await.is_err());
        // Neither agent was launched.
        assert!(launcher.launch_attempts().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_leaves_scheduled_with_partial_records() {
        let store = Arc::new(FlakyStore::new());
        let game = seeded_store(store.as_ref(), "alpha", "beta").await;
        store.fail_appends_after(2);

        let launcher = MockAgentLauncher::new();
        launcher.register("alpha", take_one_factory);
        launcher.register("beta", take_one_factory);

        let runner = runner_with(
            Arc::clone(&store) as Arc<dyn GameStore>,
            Arc::new(NimRules::new(10)),
            Arc::new(launcher),
        );

        assert!(runner.run(&game).await.is_err());

        // The two acknowledged records remain; the game is still scheduled
        // and safe to audit later.
        assert_eq!(store.record_count(game.id).await.unwrap(), 2);
        let stored = store.game(game.id).await.unwrap();
        assert_eq!(stored.status, GameStatus::Scheduled);
    }

    /// Rules engine stub reporting a verdict the runner cannot map.
    struct UndecidedRules;

    #[async_trait]
    impl RulesEngine for UndecidedRules {
        fn standard_start(&self) -> GameState {
            GameState(serde_json::json!({}))
        }

        async fn execute_game(
            &self,
            _white: Box<dyn MoveAgent>,
            _black: Box<dyn MoveAgent>,
            _config: PlayConfig,
            _observer: &mut dyn StateObserver,
        ) -> crate::error::Result<GameVerdict> {
            Ok(GameVerdict {
                outcome: Outcome::Undecided,
                reason: "gave up".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_unmapped_outcome_leaves_game_scheduled() {
        let store: Arc<dyn GameStore> = Arc::new(InMemoryStore::new());
        let game = seeded_store(store.as_ref(), "alpha", "beta").await;

        let launcher = MockAgentLauncher::new();
        launcher.register("alpha", take_one_factory);
        launcher.register("beta", take_one_factory);

        let runner = runner_with(Arc::clone(&store), Arc::new(UndecidedRules), Arc::new(launcher));

        let err = runner.run(&game).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArenaError>(),
            Some(ArenaError::UnmappedOutcome {
                outcome: Outcome::Undecided
            })
        ));

        let stored = store.game(game.id).await.unwrap();
        assert_eq!(stored.status, GameStatus::Scheduled);
    }
}
