//! Rating system for the arena service
//!
//! This module provides the two-player rating model seam and the engine
//! that recomputes every player's rating from the full decided-game
//! history.

pub mod engine;
pub mod model;

pub use engine::RatingEngine;
pub use model::{FixedDeltaModel, RatingModel, TrueSkillModel};
