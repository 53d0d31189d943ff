//! Rating engine: full-history recomputation and ranking
//!
//! Ratings are never stored; they are recomputed on demand by replaying the
//! decided-game history, in order, against the configured model and prior.
//! Rating trajectories are path-dependent, so the order of results matters.

use crate::config::RatingConfig;
use crate::error::ArenaError;
use crate::rating::model::RatingModel;
use crate::types::{GameResult, PlayerId, Ranking, Rating};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Recomputes all players' ratings from game history and ranks them.
pub struct RatingEngine {
    model: Arc<dyn RatingModel>,
    prior: Rating,
}

impl RatingEngine {
    /// Create an engine over a model, taking the default prior from the
    /// supplied configuration.
    pub fn new(model: Arc<dyn RatingModel>, config: &RatingConfig) -> Self {
        Self {
            model,
            prior: config.initial_rating(),
        }
    }

    /// Rate the full ordered history of decided results and return a
    /// ranking for every rostered player.
    ///
    /// Every participant referenced by a result must appear in `players`;
    /// replaying the same ordered history twice is deterministic.
    pub fn rate_games(
        &self,
        players: &[PlayerId],
        results: &[GameResult],
    ) -> crate::error::Result<Vec<Ranking>> {
        check_participants_are_rostered(players, results)?;

        let mut ratings: HashMap<PlayerId, Rating> = players
            .iter()
            .map(|player| (player.clone(), self.prior))
            .collect();

        for result in results {
            let white = ratings[&result.white];
            let black = ratings[&result.black];
            let (new_white, new_black) = self.model.rate(white, black, result.outcome)?;
            ratings.insert(result.white.clone(), new_white);
            ratings.insert(result.black.clone(), new_black);
        }

        let mut rankings: Vec<Ranking> = ratings
            .into_iter()
            .map(|(player_id, rating)| Ranking {
                player_id,
                rating,
                rank: 0,
            })
            .collect();

        // Better rating first: higher mean, then (for tied means) the one we
        // are more certain about. Player id last, purely to make the output
        // deterministic.
        rankings.sort_by(|a, b| {
            b.rating
                .mean
                .partial_cmp(&a.rating.mean)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    a.rating
                        .stddev
                        .partial_cmp(&b.rating.stddev)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(a.player_id.cmp(&b.player_id))
        });

        // Competition ranking: identical ratings share a rank, the next
        // distinct rating continues at position + 1.
        let mut prev: Option<Rating> = None;
        for position in 0..rankings.len() {
            if prev == Some(rankings[position].rating) {
                rankings[position].rank = rankings[position - 1].rank;
            } else {
                rankings[position].rank = position + 1;
            }
            prev = Some(rankings[position].rating);
        }

        Ok(rankings)
    }
}

fn check_participants_are_rostered(
    players: &[PlayerId],
    results: &[GameResult],
) -> crate::error::Result<()> {
    let roster: HashSet<&PlayerId> = players.iter().collect();
    for result in results {
        for participant in [&result.white, &result.black] {
            if !roster.contains(participant) {
                return Err(ArenaError::UnknownParticipant {
                    player_id: participant.clone(),
                }
                .into());
            }
        }
    }
    Ok(())
}
