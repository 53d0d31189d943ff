//! Service layer for the agent-arena service
//!
//! This module contains the main application state, component wiring, the
//! ladder round loop, and health check logic for the production service.

pub mod app;
pub mod health;

pub use app::AppState;
pub use health::{HealthCheck, HealthStatus, ServiceStats};
