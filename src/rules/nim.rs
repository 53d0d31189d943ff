//! Reference rules engine: Nim
//!
//! A deliberately small complete game so the arena can run matches end to
//! end without an external engine: players alternately take 1 to 3 tokens
//! from a shared pile, and taking the last token wins. An agent that
//! proposes an illegal successor state forfeits; hitting the move limit is
//! a tie.

use crate::agent::MoveAgent;
use crate::error::ArenaError;
use crate::rules::{GameState, GameVerdict, PlayConfig, RulesEngine, StateObserver};
use crate::types::Outcome;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    fn wins(self) -> Outcome {
        match self {
            Color::White => Outcome::WhiteWins,
            Color::Black => Outcome::BlackWins,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// Board state of a Nim game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NimState {
    pub pile: u32,
    pub to_move: Color,
}

impl NimState {
    /// Wrap into the opaque snapshot form exchanged with agents.
    pub fn encode(&self) -> GameState {
        GameState(serde_json::json!({
            "pile": self.pile,
            "to_move": self.to_move,
        }))
    }

    /// Interpret an opaque snapshot as a Nim state.
    pub fn decode(state: &GameState) -> Result<Self, serde_json::Error> {
        serde_json::from_value(state.0.clone())
    }
}

/// The Nim rules engine.
#[derive(Debug, Clone)]
pub struct NimRules {
    /// Tokens on the pile in the standard starting position.
    pub start_pile: u32,
    /// Maximum tokens a single move may take.
    pub take_max: u32,
}

impl Default for NimRules {
    fn default() -> Self {
        Self {
            start_pile: 21,
            take_max: 3,
        }
    }
}

impl NimRules {
    pub fn new(start_pile: u32) -> Self {
        Self {
            start_pile,
            ..Self::default()
        }
    }

    fn is_legal_successor(&self, current: &NimState, next: &NimState) -> bool {
        next.to_move == current.to_move.opposite()
            && next.pile < current.pile
            && current.pile - next.pile <= self.take_max
    }
}

#[async_trait]
impl RulesEngine for NimRules {
    fn standard_start(&self) -> GameState {
        NimState {
            pile: self.start_pile,
            to_move: Color::White,
        }
        .encode()
    }

    async fn execute_game(
        &self,
        mut white: Box<dyn MoveAgent>,
        mut black: Box<dyn MoveAgent>,
        config: PlayConfig,
        observer: &mut dyn StateObserver,
    ) -> crate::error::Result<GameVerdict> {
        let mut current =
            NimState::decode(&config.start).map_err(|err| ArenaError::Internal {
                message: format!("invalid start state: {}", err),
            })?;

        for _ in 0..config.move_limit {
            let mover = current.to_move;
            let agent = match mover {
                Color::White => white.as_mut(),
                Color::Black => black.as_mut(),
            };

            let proposed = agent.propose_state(&current.encode()).await?;
            let next = match NimState::decode(&proposed) {
                Ok(next) => next,
                Err(err) => {
                    return Err(ArenaError::Protocol {
                        player_id: agent.player_id().clone(),
                        reason: format!("proposed state is not a Nim state: {}", err),
                    }
                    .into())
                }
            };

            if !self.is_legal_successor(&current, &next) {
                return Ok(GameVerdict {
                    outcome: mover.opposite().wins(),
                    reason: format!("illegal move by {}", mover),
                });
            }

            // Play must not advance until the transition is durably observed.
            observer.observe(&proposed).await?;

            if next.pile == 0 {
                return Ok(GameVerdict {
                    outcome: mover.wins(),
                    reason: "took the last token".to_string(),
                });
            }

            current = next;
        }

        Ok(GameVerdict {
            outcome: Outcome::Tie,
            reason: "move limit reached".to_string(),
        })
    }
}
