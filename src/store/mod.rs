//! Persistent store interface and implementations
//!
//! This module defines the transactional storage boundary for players,
//! matches, games, and per-turn records, with an in-memory implementation
//! suitable for tests and single-node deployments.

pub mod memory;

pub use memory::{FlakyStore, InMemoryStore};

use crate::types::{Game, GameId, GameResult, GameStatus, Match, MatchId, Player, PlayerId, Record};
use async_trait::async_trait;

/// Trait for store operations over the four record kinds.
///
/// Implementations must provide atomic single-row updates for game status
/// transitions, and keep records append-only with gapless turn numbering
/// per game.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Register a new player.
    async fn create_player(&self, player: Player) -> crate::error::Result<Player>;

    /// Fetch a player by id.
    async fn player(&self, id: &PlayerId) -> crate::error::Result<Player>;

    /// List all registered players.
    async fn list_players(&self) -> crate::error::Result<Vec<Player>>;

    /// Create a new match row for an unordered pair of players.
    async fn create_match(
        &self,
        player1: PlayerId,
        player2: PlayerId,
    ) -> crate::error::Result<Match>;

    /// List all matches.
    async fn list_matches(&self) -> crate::error::Result<Vec<Match>>;

    /// Create a new game row.
    async fn create_game(&self, game: Game) -> crate::error::Result<Game>;

    /// Fetch a game by id.
    async fn game(&self, id: GameId) -> crate::error::Result<Game>;

    /// List all games.
    async fn list_games(&self) -> crate::error::Result<Vec<Game>>;

    /// Find all games belonging to a match.
    async fn games_for_match(&self, match_id: MatchId) -> crate::error::Result<Vec<Game>>;

    /// Count the records stored for a game.
    async fn record_count(&self, game_id: GameId) -> crate::error::Result<u32>;

    /// Append a per-turn record. Fails unless `turn_num` is exactly one more
    /// than the current stored count for the game.
    async fn append_record(&self, record: Record) -> crate::error::Result<()>;

    /// All records for a game, ordered by turn number.
    async fn records_for_game(&self, game_id: GameId) -> crate::error::Result<Vec<Record>>;

    /// Atomically move a game from `Scheduled` to a terminal status,
    /// setting the victory reason. Fails if the game is already decided or
    /// if `status` is not terminal.
    async fn finalize_game(
        &self,
        game_id: GameId,
        status: GameStatus,
        reason: String,
    ) -> crate::error::Result<Game>;

    /// Results of all decided games, in the order they were decided.
    async fn decided_results(&self) -> crate::error::Result<Vec<GameResult>>;
}
