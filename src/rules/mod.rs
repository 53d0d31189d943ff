//! Rules engine interface
//!
//! The arena treats the game itself as a black box: a rules engine exposes a
//! standard starting state, drives play between two move-producing agents,
//! invokes a state observer synchronously after every transition, and
//! reports a terminal verdict. The orchestration core depends only on the
//! traits defined here.

pub mod nim;

pub use nim::NimRules;

use crate::agent::MoveAgent;
use crate::types::Outcome;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque board state snapshot exchanged with agents and persisted per turn.
///
/// The arena never inspects the payload; only the owning rules engine can
/// interpret it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState(pub serde_json::Value);

impl GameState {
    /// Serialize the snapshot for persistence.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

/// Terminal result of one game execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameVerdict {
    pub outcome: Outcome,
    /// Human-readable victory reason, stored on the game row.
    pub reason: String,
}

/// Per-execution parameters handed to a rules engine.
#[derive(Debug, Clone)]
pub struct PlayConfig {
    /// Position play starts from.
    pub start: GameState,
    /// Turns after which an undecided game is declared a tie.
    pub move_limit: u32,
}

/// Callback invoked synchronously after every state transition.
///
/// The engine must not advance to the next turn until `observe` returns;
/// an error aborts the game execution.
#[async_trait]
pub trait StateObserver: Send {
    async fn observe(&mut self, state: &GameState) -> crate::error::Result<()>;
}

/// A rules engine: owns the board representation, move legality, and
/// outcome determination for one game type.
#[async_trait]
pub trait RulesEngine: Send + Sync {
    /// The standard starting position.
    fn standard_start(&self) -> GameState;

    /// Drive a game between two agents to completion, reporting every
    /// state transition to `observer` before continuing.
    async fn execute_game(
        &self,
        white: Box<dyn MoveAgent>,
        black: Box<dyn MoveAgent>,
        config: PlayConfig,
        observer: &mut dyn StateObserver,
    ) -> crate::error::Result<GameVerdict>;
}
