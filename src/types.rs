//! Common types used throughout the arena service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillratings::trueskill::TrueSkillRating;
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for registered players (agent owners)
pub type PlayerId = String;

/// Unique identifier for matches
pub type MatchId = Uuid;

/// Unique identifier for games
pub type GameId = Uuid;

/// A registered player: an AI agent with a launchable artifact.
///
/// Immutable once created; administrative edits happen outside this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    /// Path of the launchable agent artifact, relative to the artifact root.
    pub artifact_path: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// A scheduling intention pairing two players for a fairness-balanced set of
/// games. Created once per matchmaking decision and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub created_at: DateTime<Utc>,
}

/// Color assignment for one game. Named fields so a white/black swap is a
/// visible bug, not a silent argument transposition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seats {
    pub white: PlayerId,
    pub black: PlayerId,
}

/// Lifecycle status of a game. Transitions exactly once, from `Scheduled`
/// to one of the terminal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    Scheduled,
    WhiteWins,
    BlackWins,
    Draw,
}

impl GameStatus {
    /// Whether this status ends a game.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameStatus::Scheduled)
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::Scheduled => write!(f, "scheduled"),
            GameStatus::WhiteWins => write!(f, "white-wins"),
            GameStatus::BlackWins => write!(f, "black-wins"),
            GameStatus::Draw => write!(f, "draw"),
        }
    }
}

/// One contest instance with a definite color assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    /// Back-reference to the owning match.
    pub match_id: MatchId,
    pub seats: Seats,
    pub status: GameStatus,
    /// Victory reason, set together with the terminal status.
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// An immutable snapshot of game state at a given turn.
///
/// `turn_num` is 1-based and gapless per game; the store rejects
/// out-of-sequence appends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub game_id: GameId,
    pub turn_num: u32,
    /// JSON-serialized board state.
    pub state: String,
    pub recorded_at: DateTime<Utc>,
}

/// Terminal result classification reported by a rules engine.
///
/// `Undecided` is what an engine reports for a game still in progress; it has
/// no terminal `GameStatus` mapping and surfaces as an `UnmappedOutcome`
/// error if it ever reaches the runner's finalization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Undecided,
    WhiteWins,
    BlackWins,
    Tie,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Undecided => write!(f, "undecided"),
            Outcome::WhiteWins => write!(f, "white-wins"),
            Outcome::BlackWins => write!(f, "black-wins"),
            Outcome::Tie => write!(f, "tie"),
        }
    }
}

/// (mean, standard deviation) belief about a player's skill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub mean: f64,
    pub stddev: f64,
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{μ:{:.6} σ:{:.6}}}", self.mean, self.stddev)
    }
}

impl From<TrueSkillRating> for Rating {
    fn from(rating: TrueSkillRating) -> Self {
        Self {
            mean: rating.rating,
            stddev: rating.uncertainty,
        }
    }
}

impl From<Rating> for TrueSkillRating {
    fn from(rating: Rating) -> Self {
        Self {
            rating: rating.mean,
            uncertainty: rating.stddev,
        }
    }
}

/// A rating annotated with a competition-style rank position (1 = best;
/// identical ratings share a rank).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ranking {
    pub player_id: PlayerId,
    pub rating: Rating,
    pub rank: usize,
}

/// The minimal tuple extracted from a decided game, fed into rating
/// recomputation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    pub white: PlayerId,
    pub black: PlayerId,
    pub outcome: Outcome,
}

/// Which colors each player of a match has already played, derived by
/// scanning the match's stored games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleCoverage {
    pub player1_as_white: bool,
    pub player1_as_black: bool,
    pub player2_as_white: bool,
    pub player2_as_black: bool,
}

impl RoleCoverage {
    /// The stored game set is symmetric: whenever one player appeared as
    /// white, the other appeared as black, and vice versa.
    pub fn is_symmetric(&self) -> bool {
        self.player1_as_white == self.player2_as_black
            && self.player1_as_black == self.player2_as_white
    }
}

impl std::fmt::Display for RoleCoverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "p1-white:{} p1-black:{} p2-white:{} p2-black:{}",
            self.player1_as_white,
            self.player1_as_black,
            self.player2_as_white,
            self.player2_as_black
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_status_terminality() {
        assert!(!GameStatus::Scheduled.is_terminal());
        assert!(GameStatus::WhiteWins.is_terminal());
        assert!(GameStatus::BlackWins.is_terminal());
        assert!(GameStatus::Draw.is_terminal());
    }

    #[test]
    fn test_role_coverage_symmetry() {
        let empty = RoleCoverage::default();
        assert!(empty.is_symmetric());

        let complete = RoleCoverage {
            player1_as_white: true,
            player1_as_black: true,
            player2_as_white: true,
            player2_as_black: true,
        };
        assert!(complete.is_symmetric());

        // Player 1 played white, but player 2 never sat as black.
        let lopsided = RoleCoverage {
            player1_as_white: true,
            ..RoleCoverage::default()
        };
        assert!(!lopsided.is_symmetric());
    }

    #[test]
    fn test_rating_trueskill_round_trip() {
        let rating = Rating {
            mean: 27.5,
            stddev: 4.2,
        };
        let converted: TrueSkillRating = rating.into();
        assert_eq!(converted.rating, 27.5);
        assert_eq!(converted.uncertainty, 4.2);

        let back: Rating = converted.into();
        assert_eq!(back, rating);
    }
}
