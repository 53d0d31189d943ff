//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! agent-arena service, including environment variable loading, TOML file
//! loading, and validation.

use crate::config::rating::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub agents: AgentSettings,
    pub ladder: LadderSettings,
    pub rating: RatingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Port for health check and metrics endpoints
    pub health_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Agent launching settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Directory containing player agent artifacts
    pub artifact_root: PathBuf,
    /// First port of the reservable endpoint range (inclusive)
    pub port_range_start: u16,
    /// Last port of the reservable endpoint range (inclusive)
    pub port_range_end: u16,
    /// How long to wait for a launched agent to accept a connection
    pub connect_timeout_ms: u64,
}

/// Ladder loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderSettings {
    /// Seconds between ladder rounds (rate, propose, dispatch)
    pub round_interval_seconds: u64,
    /// Maximum number of turns before a game is declared a tie
    pub move_limit: u32,
    /// Players registered at startup
    pub roster: Vec<RosterEntry>,
}

/// One roster entry: a player to register at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    /// Player identifier (must be unique)
    pub id: String,
    /// Display name; defaults to the id when omitted
    pub display_name: Option<String>,
    /// Agent artifact path, relative to the artifact root
    pub artifact: PathBuf,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "agent-arena".to_string(),
            log_level: "info".to_string(),
            health_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            artifact_root: PathBuf::from("./agents"),
            port_range_start: 42000,
            port_range_end: 42063,
            connect_timeout_ms: 5000,
        }
    }
}

impl Default for LadderSettings {
    fn default() -> Self {
        Self {
            round_interval_seconds: 30,
            move_limit: 200,
            roster: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(port) = env::var("HEALTH_PORT") {
            config.service.health_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HEALTH_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Agent settings
        if let Ok(root) = env::var("ARTIFACT_ROOT") {
            config.agents.artifact_root = PathBuf::from(root);
        }
        if let Ok(start) = env::var("AGENT_PORT_RANGE_START") {
            config.agents.port_range_start = start
                .parse()
                .map_err(|_| anyhow!("Invalid AGENT_PORT_RANGE_START value: {}", start))?;
        }
        if let Ok(end) = env::var("AGENT_PORT_RANGE_END") {
            config.agents.port_range_end = end
                .parse()
                .map_err(|_| anyhow!("Invalid AGENT_PORT_RANGE_END value: {}", end))?;
        }
        if let Ok(timeout) = env::var("AGENT_CONNECT_TIMEOUT_MS") {
            config.agents.connect_timeout_ms = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid AGENT_CONNECT_TIMEOUT_MS value: {}", timeout))?;
        }

        // Ladder settings
        if let Ok(interval) = env::var("ROUND_INTERVAL_SECONDS") {
            config.ladder.round_interval_seconds = interval
                .parse()
                .map_err(|_| anyhow!("Invalid ROUND_INTERVAL_SECONDS value: {}", interval))?;
        }
        if let Ok(limit) = env::var("MOVE_LIMIT") {
            config.ladder.move_limit = limit
                .parse()
                .map_err(|_| anyhow!("Invalid MOVE_LIMIT value: {}", limit))?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get ladder round interval as Duration
    pub fn round_interval(&self) -> Duration {
        Duration::from_secs(self.ladder.round_interval_seconds)
    }

    /// Get agent connect timeout as Duration
    pub fn agent_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.agents.connect_timeout_ms)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports
    if config.service.health_port == 0 {
        return Err(anyhow!("Health port cannot be 0"));
    }
    if config.agents.port_range_start == 0 {
        return Err(anyhow!("Agent port range cannot start at 0"));
    }
    if config.agents.port_range_start > config.agents.port_range_end {
        return Err(anyhow!(
            "Agent port range is empty: {} > {}",
            config.agents.port_range_start,
            config.agents.port_range_end
        ));
    }

    // Validate timeouts
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }
    if config.agents.connect_timeout_ms == 0 {
        return Err(anyhow!("Agent connect timeout must be greater than 0"));
    }

    // Validate ladder settings
    if config.ladder.round_interval_seconds == 0 {
        return Err(anyhow!("Round interval must be greater than 0"));
    }
    if config.ladder.move_limit == 0 {
        return Err(anyhow!("Move limit must be greater than 0"));
    }
    let mut seen = std::collections::HashSet::new();
    for entry in &config.ladder.roster {
        if entry.id.is_empty() {
            return Err(anyhow!("Roster entries must have a non-empty id"));
        }
        if !seen.insert(entry.id.as_str()) {
            return Err(anyhow!("Duplicate roster entry: {}", entry.id));
        }
    }

    config.rating.validate()?;

    Ok(())
}
