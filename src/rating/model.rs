//! Two-player rating model interface and implementations
//!
//! The model is a pure function from a prior rating pair and a game outcome
//! to an updated rating pair. Keeping the interface this narrow makes the
//! two-player constraint and the statistical model swappable without
//! touching orchestration logic.

use crate::config::RatingConfig;
use crate::error::ArenaError;
use crate::types::{Outcome, Rating};
use skillratings::trueskill::{trueskill, TrueSkillConfig};
use skillratings::Outcomes;

/// Trait for two-player rating updates.
pub trait RatingModel: Send + Sync {
    /// Compute updated ratings for (white, black) given the game outcome.
    ///
    /// Only decided outcomes are rateable; `Undecided` is an error.
    fn rate(
        &self,
        white: Rating,
        black: Rating,
        outcome: Outcome,
    ) -> crate::error::Result<(Rating, Rating)>;
}

fn outcome_for_white(outcome: Outcome) -> crate::error::Result<Outcomes> {
    match outcome {
        Outcome::WhiteWins => Ok(Outcomes::WIN),
        Outcome::BlackWins => Ok(Outcomes::LOSS),
        Outcome::Tie => Ok(Outcomes::DRAW),
        Outcome::Undecided => Err(ArenaError::UnmappedOutcome { outcome }.into()),
    }
}

/// TrueSkill-backed rating model from the skillratings crate.
#[derive(Debug)]
pub struct TrueSkillModel {
    config: TrueSkillConfig,
}

impl TrueSkillModel {
    /// Create a model from validated rating configuration.
    pub fn new(config: &RatingConfig) -> crate::error::Result<Self> {
        config.validate()?;

        Ok(Self {
            config: config.trueskill_config(),
        })
    }
}

impl RatingModel for TrueSkillModel {
    fn rate(
        &self,
        white: Rating,
        black: Rating,
        outcome: Outcome,
    ) -> crate::error::Result<(Rating, Rating)> {
        let outcome = outcome_for_white(outcome)?;
        let (new_white, new_black) =
            trueskill(&white.into(), &black.into(), &outcome, &self.config);
        Ok((new_white.into(), new_black.into()))
    }
}

/// Trivially predictable rating model for testing and fallback: the winner
/// gains a fixed delta, the loser loses it, and both uncertainties shrink.
#[derive(Debug, Clone)]
pub struct FixedDeltaModel {
    pub delta: f64,
    pub shrink: f64,
}

impl Default for FixedDeltaModel {
    fn default() -> Self {
        Self {
            delta: 10.0,
            shrink: 0.95,
        }
    }
}

impl RatingModel for FixedDeltaModel {
    fn rate(
        &self,
        white: Rating,
        black: Rating,
        outcome: Outcome,
    ) -> crate::error::Result<(Rating, Rating)> {
        let (white_delta, black_delta) = match outcome {
            Outcome::WhiteWins => (self.delta, -self.delta),
            Outcome::BlackWins => (-self.delta, self.delta),
            Outcome::Tie => (0.0, 0.0),
            Outcome::Undecided => {
                return Err(ArenaError::UnmappedOutcome { outcome }.into());
            }
        };

        Ok((
            Rating {
                mean: white.mean + white_delta,
                stddev: white.stddev * self.shrink,
            },
            Rating {
                mean: black.mean + black_delta,
                stddev: black.stddev * self.shrink,
            },
        ))
    }
}
