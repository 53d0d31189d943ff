//! Agent Arena - Match orchestration and rating for AI-agent ladders
//!
//! This crate runs automated matches between AI agents playing a two-player
//! abstract strategy game, recomputes skill ratings from game history, and
//! proposes the next pairing to play.

pub mod agent;
pub mod config;
pub mod error;
pub mod matchmaking;
pub mod metrics;
pub mod orchestrator;
pub mod rating;
pub mod rules;
pub mod service;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{ArenaError, Result};
pub use types::*;

// Re-export key components
pub use matchmaking::{PairingStrategy, UncertaintyMatchmaker};
pub use orchestrator::{GameRunner, MatchOrchestrator};
pub use rating::RatingEngine;
pub use store::{GameStore, InMemoryStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
