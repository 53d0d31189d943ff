//! Metrics and monitoring for the agent-arena service
//!
//! This module provides Prometheus metrics collection and the HTTP
//! health/metrics endpoints for the arena service.

pub mod collector;
pub mod health;

pub use collector::{MatchMetrics, MetricsCollector, RatingMetrics, ServiceMetrics};
pub use health::{HealthServer, HealthServerConfig};
