//! Error types for the arena service
//!
//! This module defines all error types using anyhow for consistent error
//! handling throughout the application.

use crate::types::{GameId, MatchId, Outcome, PlayerId, RoleCoverage};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific arena scenarios
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("game history for match {match_id} is inconsistent ({coverage})")]
    Consistency {
        match_id: MatchId,
        coverage: RoleCoverage,
    },

    #[error("player {player_id} participated in a game but is not in the roster")]
    UnknownParticipant { player_id: PlayerId },

    #[error("cannot propose a pairing when there are no rankings")]
    EmptyRankings,

    #[error("need at least two ranked players to propose a pairing, have {available}")]
    NotEnoughRankings { available: usize },

    #[error("failed to launch agent for player {player_id}: {reason}")]
    Launch { player_id: PlayerId, reason: String },

    #[error("agent for player {player_id} broke the move protocol: {reason}")]
    Protocol { player_id: PlayerId, reason: String },

    #[error("storage operation failed: {message}")]
    Persistence { message: String },

    #[error("rules engine reported outcome {outcome}, which maps to no terminal status")]
    UnmappedOutcome { outcome: Outcome },

    #[error("player not found: {player_id}")]
    PlayerNotFound { player_id: PlayerId },

    #[error("game not found: {game_id}")]
    GameNotFound { game_id: GameId },

    #[error("no free agent endpoints available")]
    PortsExhausted,

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("internal service error: {message}")]
    Internal { message: String },
}
