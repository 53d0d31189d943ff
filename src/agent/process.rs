//! Process-backed agent launcher
//!
//! Spawns a player's agent artifact as a child process listening on a
//! reserved localhost port, then exchanges newline-delimited JSON states
//! over TCP: the current state goes out, the successor state comes back.
//! The child is killed when the agent handle drops.

use crate::agent::{AgentLauncher, MoveAgent, PortPool, ReservedPort};
use crate::error::ArenaError;
use crate::rules::GameState;
use crate::types::{Player, PlayerId};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Settings for launching agent processes.
#[derive(Debug, Clone)]
pub struct ProcessLaunchConfig {
    /// Directory that player artifact paths are resolved against.
    pub artifact_root: PathBuf,
    /// How long to wait for a freshly spawned agent to accept a connection.
    pub connect_timeout: Duration,
}

/// Launcher that runs agents as local child processes.
pub struct ProcessAgentLauncher {
    config: ProcessLaunchConfig,
}

impl ProcessAgentLauncher {
    pub fn new(config: ProcessLaunchConfig) -> Self {
        Self { config }
    }

    async fn connect_with_retry(
        &self,
        player_id: &PlayerId,
        address: &str,
    ) -> crate::error::Result<TcpStream> {
        let deadline = tokio::time::Instant::now() + self.config.connect_timeout;

        loop {
            match TcpStream::connect(address).await {
                Ok(stream) => return Ok(stream),
                Err(err) => {
                    if tokio::time::Instant::now() >= deadline {
                        return Err(ArenaError::Launch {
                            player_id: player_id.clone(),
                            reason: format!("agent never came up on {}: {}", address, err),
                        }
                        .into());
                    }
                    debug!(
                        "Agent for '{}' not yet listening on {}, retrying...",
                        player_id, address
                    );
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

#[async_trait]
impl AgentLauncher for ProcessAgentLauncher {
    async fn launch(
        &self,
        player: &Player,
        ports: &Arc<PortPool>,
    ) -> crate::error::Result<Box<dyn MoveAgent>> {
        let executable = self.config.artifact_root.join(&player.artifact_path);
        if !executable.is_file() {
            return Err(ArenaError::Launch {
                player_id: player.id.clone(),
                reason: format!("artifact {} does not exist", executable.display()),
            }
            .into());
        }

        let reserved = ports.reserve()?;
        let address = reserved.address();

        info!(
            "Launching agent for player '{}' from {} on {}",
            player.id,
            executable.display(),
            address
        );

        let child = Command::new(&executable)
            .arg("--listen")
            .arg(&address)
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| ArenaError::Launch {
                player_id: player.id.clone(),
                reason: format!("failed to spawn {}: {}", executable.display(), err),
            })?;

        let stream = self.connect_with_retry(&player.id, &address).await?;
        let (read_half, write_half) = stream.into_split();

        Ok(Box::new(ProcessAgent {
            player_id: player.id.clone(),
            reader: BufReader::new(read_half),
            writer: write_half,
            _child: child,
            _reserved: reserved,
        }))
    }
}

/// Move-producing handle over one agent process.
struct ProcessAgent {
    player_id: PlayerId,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    /// Kept for kill-on-drop.
    _child: Child,
    /// Port returns to the pool when the agent drops.
    _reserved: ReservedPort,
}

#[async_trait]
impl MoveAgent for ProcessAgent {
    fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    async fn propose_state(&mut self, state: &GameState) -> crate::error::Result<GameState> {
        let mut frame = serde_json::to_string(&state.0)?;
        frame.push('\n');

        self.writer
            .write_all(frame.as_bytes())
            .await
            .map_err(|err| ArenaError::Protocol {
                player_id: self.player_id.clone(),
                reason: format!("failed to send state: {}", err),
            })?;

        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|err| ArenaError::Protocol {
                player_id: self.player_id.clone(),
                reason: format!("failed to read reply: {}", err),
            })?;

        if read == 0 {
            return Err(ArenaError::Protocol {
                player_id: self.player_id.clone(),
                reason: "agent closed the connection".to_string(),
            }
            .into());
        }

        let value: serde_json::Value =
            serde_json::from_str(line.trim()).map_err(|err| ArenaError::Protocol {
                player_id: self.player_id.clone(),
                reason: format!("reply is not valid JSON: {}", err),
            })?;

        Ok(GameState(value))
    }
}
