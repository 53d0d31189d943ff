//! In-memory store implementation
//!
//! Backs the test suites and single-node deployments. Storage invariants
//! (single status transition per game, gapless per-game turn numbering,
//! decision-ordered results) are enforced here rather than trusted to
//! callers.

use crate::error::ArenaError;
use crate::store::GameStore;
use crate::types::{
    Game, GameId, GameResult, GameStatus, Match, MatchId, Outcome, Player, PlayerId, Record,
};
use crate::utils::{current_timestamp, generate_match_id};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory store over the four record kinds.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    players: RwLock<HashMap<PlayerId, Player>>,
    matches: RwLock<HashMap<MatchId, Match>>,
    games: RwLock<HashMap<GameId, Game>>,
    records: RwLock<HashMap<GameId, Vec<Record>>>,
    /// Game ids in the order their status became terminal.
    decided: RwLock<Vec<GameId>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_error(what: &str) -> ArenaError {
        ArenaError::Internal {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}

fn status_to_outcome(status: GameStatus) -> Option<Outcome> {
    match status {
        GameStatus::WhiteWins => Some(Outcome::WhiteWins),
        GameStatus::BlackWins => Some(Outcome::BlackWins),
        GameStatus::Draw => Some(Outcome::Tie),
        GameStatus::Scheduled => None,
    }
}

#[async_trait]
impl GameStore for InMemoryStore {
    async fn create_player(&self, player: Player) -> crate::error::Result<Player> {
        let mut players = self
            .players
            .write()
            .map_err(|_| Self::lock_error("players"))?;

        if players.contains_key(&player.id) {
            return Err(ArenaError::Persistence {
                message: format!("player {} already exists", player.id),
            }
            .into());
        }

        players.insert(player.id.clone(), player.clone());
        Ok(player)
    }

    async fn player(&self, id: &PlayerId) -> crate::error::Result<Player> {
        let players = self
            .players
            .read()
            .map_err(|_| Self::lock_error("players"))?;

        players
            .get(id)
            .cloned()
            .ok_or_else(|| ArenaError::PlayerNotFound {
                player_id: id.clone(),
            }
            .into())
    }

    async fn list_players(&self) -> crate::error::Result<Vec<Player>> {
        let players = self
            .players
            .read()
            .map_err(|_| Self::lock_error("players"))?;

        let mut all: Vec<Player> = players.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn create_match(
        &self,
        player1: PlayerId,
        player2: PlayerId,
    ) -> crate::error::Result<Match> {
        let contest = Match {
            id: generate_match_id(),
            player1,
            player2,
            created_at: current_timestamp(),
        };

        let mut matches = self
            .matches
            .write()
            .map_err(|_| Self::lock_error("matches"))?;

        matches.insert(contest.id, contest.clone());
        Ok(contest)
    }

    async fn list_matches(&self) -> crate::error::Result<Vec<Match>> {
        let matches = self
            .matches
            .read()
            .map_err(|_| Self::lock_error("matches"))?;

        let mut all: Vec<Match> = matches.values().cloned().collect();
        all.sort_by_key(|m| m.created_at);
        Ok(all)
    }

    async fn create_game(&self, game: Game) -> crate::error::Result<Game> {
        let mut games = self.games.write().map_err(|_| Self::lock_error("games"))?;

        if games.contains_key(&game.id) {
            return Err(ArenaError::Persistence {
                message: format!("game {} already exists", game.id),
            }
            .into());
        }

        games.insert(game.id, game.clone());
        Ok(game)
    }

    async fn game(&self, id: GameId) -> crate::error::Result<Game> {
        let games = self.games.read().map_err(|_| Self::lock_error("games"))?;

        games
            .get(&id)
            .cloned()
            .ok_or_else(|| ArenaError::GameNotFound { game_id: id }.into())
    }

    async fn list_games(&self) -> crate::error::Result<Vec<Game>> {
        let games = self.games.read().map_err(|_| Self::lock_error("games"))?;

        let mut all: Vec<Game> = games.values().cloned().collect();
        all.sort_by_key(|g| g.created_at);
        Ok(all)
    }

    async fn games_for_match(&self, match_id: MatchId) -> crate::error::Result<Vec<Game>> {
        let games = self.games.read().map_err(|_| Self::lock_error("games"))?;

        let mut found: Vec<Game> = games
            .values()
            .filter(|g| g.match_id == match_id)
            .cloned()
            .collect();
        found.sort_by_key(|g| g.created_at);
        Ok(found)
    }

    async fn record_count(&self, game_id: GameId) -> crate::error::Result<u32> {
        let records = self
            .records
            .read()
            .map_err(|_| Self::lock_error("records"))?;

        Ok(records.get(&game_id).map(|r| r.len() as u32).unwrap_or(0))
    }

    async fn append_record(&self, record: Record) -> crate::error::Result<()> {
        {
            let games = self.games.read().map_err(|_| Self::lock_error("games"))?;
            if !games.contains_key(&record.game_id) {
                return Err(ArenaError::GameNotFound {
                    game_id: record.game_id,
                }
                .into());
            }
        }

        let mut records = self
            .records
            .write()
            .map_err(|_| Self::lock_error("records"))?;

        let entry = records.entry(record.game_id).or_default();
        let expected = entry.len() as u32 + 1;
        if record.turn_num != expected {
            return Err(ArenaError::Persistence {
                message: format!(
                    "out-of-sequence record for game {}: got turn {}, expected {}",
                    record.game_id, record.turn_num, expected
                ),
            }
            .into());
        }

        entry.push(record);
        Ok(())
    }

    async fn records_for_game(&self, game_id: GameId) -> crate::error::Result<Vec<Record>> {
        let records = self
            .records
            .read()
            .map_err(|_| Self::lock_error("records"))?;

        Ok(records.get(&game_id).cloned().unwrap_or_default())
    }

    async fn finalize_game(
        &self,
        game_id: GameId,
        status: GameStatus,
        reason: String,
    ) -> crate::error::Result<Game> {
        if !status.is_terminal() {
            return Err(ArenaError::Persistence {
                message: format!("cannot finalize game {} with status {}", game_id, status),
            }
            .into());
        }

        let mut games = self.games.write().map_err(|_| Self::lock_error("games"))?;

        let game = games
            .get_mut(&game_id)
            .ok_or(ArenaError::GameNotFound { game_id })?;

        if game.status.is_terminal() {
            return Err(ArenaError::Persistence {
                message: format!(
                    "game {} already decided ({}); status transitions exactly once",
                    game_id, game.status
                ),
            }
            .into());
        }

        game.status = status;
        game.reason = Some(reason);
        game.decided_at = Some(current_timestamp());
        let decided_game = game.clone();
        drop(games);

        let mut decided = self
            .decided
            .write()
            .map_err(|_| Self::lock_error("decided"))?;
        decided.push(game_id);

        Ok(decided_game)
    }

    async fn decided_results(&self) -> crate::error::Result<Vec<GameResult>> {
        let decided = self
            .decided
            .read()
            .map_err(|_| Self::lock_error("decided"))?;
        let games = self.games.read().map_err(|_| Self::lock_error("games"))?;

        let mut results = Vec::with_capacity(decided.len());
        for game_id in decided.iter() {
            let game = games
                .get(game_id)
                .ok_or(ArenaError::GameNotFound { game_id: *game_id })?;
            let outcome =
                status_to_outcome(game.status).ok_or_else(|| ArenaError::Persistence {
                    message: format!("decided log references undecided game {}", game_id),
                })?;
            results.push(GameResult {
                white: game.seats.white.clone(),
                black: game.seats.black.clone(),
                outcome,
            });
        }

        Ok(results)
    }
}

/// Store wrapper that injects failures, for exercising persistence-failure
/// paths in tests. Delegates everything to an inner store, but can fail
/// record appends after a countdown and refuse finalization.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    /// Appends remaining before append_record starts failing. `None` never fails.
    append_budget: RwLock<Option<u32>>,
    /// When true, finalize_game always fails.
    fail_finalize: RwLock<bool>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `budget` successful appends, then fail every later one.
    pub fn fail_appends_after(&self, budget: u32) {
        if let Ok(mut slot) = self.append_budget.write() {
            *slot = Some(budget);
        }
    }

    /// Make every finalize_game call fail.
    pub fn fail_finalizes(&self) {
        if let Ok(mut flag) = self.fail_finalize.write() {
            *flag = true;
        }
    }
}

#[async_trait]
impl GameStore for FlakyStore {
    async fn create_player(&self, player: Player) -> crate::error::Result<Player> {
        self.inner.create_player(player).await
    }

    async fn player(&self, id: &PlayerId) -> crate::error::Result<Player> {
        self.inner.player(id).await
    }

    async fn list_players(&self) -> crate::error::Result<Vec<Player>> {
        self.inner.list_players().await
    }

    async fn create_match(
        &self,
        player1: PlayerId,
        player2: PlayerId,
    ) -> crate::error::Result<Match> {
        self.inner.create_match(player1, player2).await
    }

    async fn list_matches(&self) -> crate::error::Result<Vec<Match>> {
        self.inner.list_matches().await
    }

    async fn create_game(&self, game: Game) -> crate::error::Result<Game> {
        self.inner.create_game(game).await
    }

    async fn game(&self, id: GameId) -> crate::error::Result<Game> {
        self.inner.game(id).await
    }

    async fn list_games(&self) -> crate::error::Result<Vec<Game>> {
        self.inner.list_games().await
    }

    async fn games_for_match(&self, match_id: MatchId) -> crate::error::Result<Vec<Game>> {
        self.inner.games_for_match(match_id).await
    }

    async fn record_count(&self, game_id: GameId) -> crate::error::Result<u32> {
        self.inner.record_count(game_id).await
    }

    async fn append_record(&self, record: Record) -> crate::error::Result<()> {
        {
            let mut budget = self.append_budget.write().map_err(|_| {
                ArenaError::Internal {
                    message: "Failed to acquire append budget lock".to_string(),
                }
            })?;
            if let Some(remaining) = budget.as_mut() {
                if *remaining == 0 {
                    return Err(ArenaError::Persistence {
                        message: "injected append failure".to_string(),
                    }
                    .into());
                }
                *remaining -= 1;
            }
        }
        self.inner.append_record(record).await
    }

    async fn records_for_game(&self, game_id: GameId) -> crate::error::Result<Vec<Record>> {
        self.inner.records_for_game(game_id).await
    }

    async fn finalize_game(
        &self,
        game_id: GameId,
        status: GameStatus,
        reason: String,
    ) -> crate::error::Result<Game> {
        let failing = self.fail_finalize.read().map(|flag| *flag).unwrap_or(false);
        if failing {
            return Err(ArenaError::Persistence {
                message: "injected finalize failure".to_string(),
            }
            .into());
        }
        self.inner.finalize_game(game_id, status, reason).await
    }

    async fn decided_results(&self) -> crate::error::Result<Vec<GameResult>> {
        self.inner.decided_results().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Seats;
    use crate::utils::generate_game_id;
    use std::path::PathBuf;

    fn test_player(id: &str) -> Player {
        Player {
            id: id.to_string(),
            display_name: id.to_string(),
            artifact_path: PathBuf::from(format!("{}/agent", id)),
            created_at: current_timestamp(),
        }
    }

    fn scheduled_game(match_id: MatchId, white: &str, black: &str) -> Game {
        Game {
            id: generate_game_id(),
            match_id,
            seats: Seats {
                white: white.to_string(),
                black: black.to_string(),
            },
            status: GameStatus::Scheduled,
            reason: None,
            created_at: current_timestamp(),
            decided_at: None,
        }
    }

    fn turn_record(game_id: GameId, turn_num: u32) -> Record {
        Record {
            game_id,
            turn_num,
            state: format!("{{\"turn\":{}}}", turn_num),
            recorded_at: current_timestamp(),
        }
    }

    #[tokio::test]
    async fn test_player_lifecycle() {
        let store = InMemoryStore::new();

        store.create_player(test_player("alpha")).await.unwrap();
        store.create_player(test_player("beta")).await.unwrap();

        let fetched = store.player(&"alpha".to_string()).await.unwrap();
        assert_eq!(fetched.id, "alpha");

        let all = store.list_players().await.unwrap();
        assert_eq!(all.len(), 2);

        // Duplicate registration is rejected.
        assert!(store.create_player(test_player("alpha")).await.is_err());

        // Unknown players surface as PlayerNotFound.
        let missing = store.player(&"gamma".to_string()).await;
        assert!(missing.is_err());
    }

    #[tokio::test]
    async fn test_games_scoped_to_match() {
        let store = InMemoryStore::new();

        let m1 = store
            .create_match("alpha".to_string(), "beta".to_string())
            .await
            .unwrap();
        let m2 = store
            .create_match("alpha".to_string(), "gamma".to_string())
            .await
            .unwrap();

        store
            .create_game(scheduled_game(m1.id, "alpha", "beta"))
            .await
            .unwrap();
        store
            .create_game(scheduled_game(m1.id, "beta", "alpha"))
            .await
            .unwrap();
        store
            .create_game(scheduled_game(m2.id, "alpha", "gamma"))
            .await
            .unwrap();

        assert_eq!(store.games_for_match(m1.id).await.unwrap().len(), 2);
        assert_eq!(store.games_for_match(m2.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_turn_numbering() {
        let store = InMemoryStore::new();
        let contest = store
            .create_match("alpha".to_string(), "beta".to_string())
            .await
            .unwrap();
        let game = store
            .create_game(scheduled_game(contest.id, "alpha", "beta"))
            .await
            .unwrap();

        assert_eq!(store.record_count(game.id).await.unwrap(), 0);

        // First record must carry turn 1, the Nth must carry N.
        for turn in 1u32..=3 {
            store
                .append_record(turn_record(game.id, turn))
                .await
                .unwrap();
            assert_eq!(store.record_count(game.id).await.unwrap(), turn);
        }

        // Gaps and duplicates are rejected.
        assert!(store.append_record(turn_record(game.id, 3)).await.is_err());
        assert!(store.append_record(turn_record(game.id, 5)).await.is_err());
        assert_eq!(store.record_count(game.id).await.unwrap(), 3);

        let records = store.records_for_game(game.id).await.unwrap();
        assert_eq!(
            records.iter().map(|r| r.turn_num).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_record_for_unknown_game_rejected() {
        let store = InMemoryStore::new();
        let result = store.append_record(turn_record(generate_game_id(), 1)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_status_transitions_exactly_once() {
        let store = InMemoryStore::new();
        let contest = store
            .create_match("alpha".to_string(), "beta".to_string())
            .await
            .unwrap();
        let game = store
            .create_game(scheduled_game(contest.id, "alpha", "beta"))
            .await
            .unwrap();

        // Finalizing to a non-terminal status is invalid.
        assert!(store
            .finalize_game(game.id, GameStatus::Scheduled, "nope".to_string())
            .await
            .is_err());

        let decided = store
            .finalize_game(game.id, GameStatus::WhiteWins, "elimination".to_string())
            .await
            .unwrap();
        assert_eq!(decided.status, GameStatus::WhiteWins);
        assert_eq!(decided.reason.as_deref(), Some("elimination"));
        assert!(decided.decided_at.is_some());

        // A second transition is refused, whatever the target status.
        assert!(store
            .finalize_game(game.id, GameStatus::BlackWins, "retry".to_string())
            .await
            .is_err());

        let stored = store.game(game.id).await.unwrap();
        assert_eq!(stored.status, GameStatus::WhiteWins);
    }

    #[tokio::test]
    async fn test_decided_results_in_decision_order() {
        let store = InMemoryStore::new();
        let contest = store
            .create_match("alpha".to_string(), "beta".to_string())
            .await
            .unwrap();

        let g1 = store
            .create_game(scheduled_game(contest.id, "alpha", "beta"))
            .await
            .unwrap();
        let g2 = store
            .create_game(scheduled_game(contest.id, "beta", "alpha"))
            .await
            .unwrap();

        // Scheduled games contribute no results.
        assert!(store.decided_results().await.unwrap().is_empty());

        // Decide the second-created game first.
        store
            .finalize_game(g2.id, GameStatus::Draw, "move limit".to_string())
            .await
            .unwrap();
        store
            .finalize_game(g1.id, GameStatus::BlackWins, "elimination".to_string())
            .await
            .unwrap();

        let results = store.decided_results().await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].white, "beta");
        assert_eq!(results[0].outcome, Outcome::Tie);
        assert_eq!(results[1].white, "alpha");
        assert_eq!(results[1].outcome, Outcome::BlackWins);
    }
}
