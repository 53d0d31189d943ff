//! Match orchestration: deciding, dispatching, and running games
//!
//! This module contains the orchestrator that computes which games a match
//! still needs and dispatches them, and the runner that drives a single
//! game to completion.

pub mod dispatch;
pub mod runner;

pub use dispatch::MatchOrchestrator;
pub use runner::{GameExecutor, GameRunner, MockGameExecutor};
