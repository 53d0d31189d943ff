//! Rating system configuration
//!
//! The default prior and the TrueSkill model parameters are an explicit
//! configuration object handed to the rating engine, never hidden globals,
//! so tests can substitute alternate priors.

use crate::error::{ArenaError, Result};
use crate::types::Rating;
use serde::{Deserialize, Serialize};
use skillratings::trueskill::TrueSkillConfig;

/// Parameters of the two-player TrueSkill model plus the default prior
/// assigned to every player before any games are rated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingConfig {
    /// Prior skill mean for an unrated player.
    pub initial_mean: f64,
    /// Prior skill uncertainty for an unrated player.
    pub initial_stddev: f64,
    /// Probability of a draw between evenly matched players.
    pub draw_probability: f64,
    /// Skill distance that gives an 80% win chance to the better player.
    pub beta: f64,
    /// Additive dynamics factor keeping ratings from freezing over time.
    pub dynamics_factor: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        // Conventional TrueSkill defaults: mean 25, stddev 25/3.
        Self {
            initial_mean: 25.0,
            initial_stddev: 25.0 / 3.0,
            draw_probability: 0.1,
            beta: 25.0 / 6.0,
            dynamics_factor: 25.0 / 300.0,
        }
    }
}

impl RatingConfig {
    /// The prior rating assigned to every player before rating replay.
    pub fn initial_rating(&self) -> Rating {
        Rating {
            mean: self.initial_mean,
            stddev: self.initial_stddev,
        }
    }

    /// The model parameters in the form the skillratings crate expects.
    pub fn trueskill_config(&self) -> TrueSkillConfig {
        TrueSkillConfig {
            draw_probability: self.draw_probability,
            beta: self.beta,
            default_dynamics: self.dynamics_factor,
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.initial_stddev <= 0.0 {
            return Err(ArenaError::Configuration {
                message: "Initial stddev must be positive".to_string(),
            }
            .into());
        }

        if !(0.0..1.0).contains(&self.draw_probability) {
            return Err(ArenaError::Configuration {
                message: "Draw probability must be in [0, 1)".to_string(),
            }
            .into());
        }

        if self.beta <= 0.0 {
            return Err(ArenaError::Configuration {
                message: "Beta must be positive".to_string(),
            }
            .into());
        }

        if self.dynamics_factor < 0.0 {
            return Err(ArenaError::Configuration {
                message: "Dynamics factor must be non-negative".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
