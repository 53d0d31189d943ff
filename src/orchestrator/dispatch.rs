//! Match orchestrator: what games does a match still need?
//!
//! Opens a match for a pair of players, scans its stored games to work out
//! which color assignments are missing under the both-colors fairness
//! policy, verifies the stored set is symmetric, and dispatches the missing
//! games as independent fire-and-forget executions.

use crate::error::ArenaError;
use crate::metrics::MetricsCollector;
use crate::orchestrator::runner::GameExecutor;
use crate::store::GameStore;
use crate::types::{Game, GameStatus, Match, PlayerId, RoleCoverage, Seats};
use crate::utils::{current_timestamp, generate_game_id};
use std::sync::Arc;
use tracing::{error, info};

/// Orchestrates the games of a match.
pub struct MatchOrchestrator {
    store: Arc<dyn GameStore>,
    executor: Arc<dyn GameExecutor>,
    metrics: Arc<MetricsCollector>,
}

impl MatchOrchestrator {
    pub fn new(
        store: Arc<dyn GameStore>,
        executor: Arc<dyn GameExecutor>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            store,
            executor,
            metrics,
        }
    }

    /// Open a new match for the unordered pair and dispatch its games.
    ///
    /// Returns once the game rows exist and their executions are launched;
    /// the caller is never blocked on game completion.
    pub async fn run(
        &self,
        player1: &PlayerId,
        player2: &PlayerId,
    ) -> crate::error::Result<Match> {
        let contest = self
            .store
            .create_match(player1.clone(), player2.clone())
            .await?;
        self.metrics.record_match_started();

        info!(
            "Opened match {} between '{}' and '{}'",
            contest.id, contest.player1, contest.player2
        );

        self.execute_match(&contest).await?;
        Ok(contest)
    }

    /// Compute and dispatch the games this match still needs.
    ///
    /// Normally the match is fresh and has no games, but resumption from
    /// partial state is tolerated: already-covered color assignments are
    /// not re-dispatched.
    pub async fn execute_match(&self, contest: &Match) -> crate::error::Result<()> {
        // The symmetric branches below are an easy place to transpose the
        // two players; keep every assignment inside a named Seats value.
        let games = self.store.games_for_match(contest.id).await?;

        let mut coverage = RoleCoverage::default();
        for game in &games {
            if game.seats.white == contest.player1 {
                coverage.player1_as_white = true;
            }
            if game.seats.black == contest.player1 {
                coverage.player1_as_black = true;
            }
            if game.seats.black == contest.player2 {
                coverage.player2_as_black = true;
            }
            if game.seats.white == contest.player2 {
                coverage.player2_as_white = true;
            }
        }

        // Game records are the sole source of truth for what has been
        // played; an asymmetric set means the database is inconsistent and
        // dispatching anything could double-schedule a color pairing.
        if !coverage.is_symmetric() {
            return Err(ArenaError::Consistency {
                match_id: contest.id,
                coverage,
            }
            .into());
        }

        if !coverage.player1_as_white {
            self.dispatch_game(
                contest,
                Seats {
                    white: contest.player1.clone(),
                    black: contest.player2.clone(),
                },
            )
            .await?;
        }

        if !coverage.player2_as_white {
            self.dispatch_game(
                contest,
                Seats {
                    white: contest.player2.clone(),
                    black: contest.player1.clone(),
                },
            )
            .await?;
        }

        Ok(())
    }

    /// Create one scheduled game row and launch its execution.
    ///
    /// Execution failures are terminal for that game only: they are logged
    /// and counted, never propagated to the orchestration caller, and the
    /// game stays visible as Scheduled for later audits.
    async fn dispatch_game(&self, contest: &Match, seats: Seats) -> crate::error::Result<()> {
        let game = Game {
            id: generate_game_id(),
            match_id: contest.id,
            seats,
            status: GameStatus::Scheduled,
            reason: None,
            created_at: current_timestamp(),
            decided_at: None,
        };

        let game = self.store.create_game(game).await?;
        self.metrics.record_game_dispatched();

        info!(
            "Dispatched game {} for match {} - white: '{}', black: '{}'",
            game.id, contest.id, game.seats.white, game.seats.black
        );

        let executor = Arc::clone(&self.executor);
        let metrics = Arc::clone(&self.metrics);
        tokio::spawn(async move {
            if let Err(err) = executor.run(&game).await {
                metrics.record_game_failed();
                error!("Game {} execution failed: {:#}", game.id, err);
            }
        });

        Ok(())
    }
}
