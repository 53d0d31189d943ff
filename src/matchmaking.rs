//! Matchmaking: who plays whom next
//!
//! Pairing strategies consume the current rankings and return an unordered
//! pair of player ids. The default strategy maximizes information gain by
//! picking the player the system knows least about and pairing them with a
//! close ranking neighbor.

use crate::error::ArenaError;
use crate::types::{PlayerId, Ranking};

/// Trait for proposing the next pairing from current rankings.
pub trait PairingStrategy: Send + Sync {
    /// Return an unordered pair of player ids to play next.
    fn propose_pairing(&self, rankings: &[Ranking]) -> crate::error::Result<(PlayerId, PlayerId)>;
}

/// Pairs the most uncertain player with their immediate ranking neighbor.
///
/// The first pick is the player with the largest rating stddev — the one a
/// game teaches the system the most about. The second is the neighbor
/// directly above them in ranking order (or directly below when the pick
/// already sits at the top), keeping the skill gap small.
#[derive(Debug, Clone, Default)]
pub struct UncertaintyMatchmaker;

impl UncertaintyMatchmaker {
    pub fn new() -> Self {
        Self
    }
}

impl PairingStrategy for UncertaintyMatchmaker {
    fn propose_pairing(&self, rankings: &[Ranking]) -> crate::error::Result<(PlayerId, PlayerId)> {
        if rankings.is_empty() {
            return Err(ArenaError::EmptyRankings.into());
        }
        if rankings.len() < 2 {
            return Err(ArenaError::NotEnoughRankings {
                available: rankings.len(),
            }
            .into());
        }

        let mut max_uncertainty = f64::NEG_INFINITY;
        let mut pick = 0;
        for (position, ranking) in rankings.iter().enumerate() {
            if ranking.rating.stddev > max_uncertainty {
                max_uncertainty = ranking.rating.stddev;
                pick = position;
            }
        }

        let neighbor = if pick == 0 { 1 } else { pick - 1 };

        Ok((
            rankings[pick].player_id.clone(),
            rankings[neighbor].player_id.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rating;

    fn ranking(player_id: &str, rank: usize, mean: f64, stddev: f64) -> Ranking {
        Ranking {
            player_id: player_id.to_string(),
            rating: Rating { mean, stddev },
            rank,
        }
    }

    #[test]
    fn test_most_uncertain_pairs_with_upward_neighbor() {
        let matchmaker = UncertaintyMatchmaker::new();
        let rankings = vec![
            ranking("p1", 1, 30.0, 5.0),
            ranking("p2", 2, 25.0, 9.0),
            ranking("p3", 3, 20.0, 3.0),
        ];

        // p2 carries the most uncertainty and pairs with p1 above it.
        let (first, second) = matchmaker.propose_pairing(&rankings).unwrap();
        assert_eq!(first, "p2");
        assert_eq!(second, "p1");
    }

    #[test]
    fn test_top_ranked_pick_pairs_downward() {
        let matchmaker = UncertaintyMatchmaker::new();
        let rankings = vec![
            ranking("p1", 1, 30.0, 9.0),
            ranking("p2", 2, 25.0, 5.0),
            ranking("p3", 3, 20.0, 3.0),
        ];

        let (first, second) = matchmaker.propose_pairing(&rankings).unwrap();
        assert_eq!(first, "p1");
        assert_eq!(second, "p2");
    }

    #[test]
    fn test_uncertainty_tie_keeps_first() {
        let matchmaker = UncertaintyMatchmaker::new();
        let rankings = vec![
            ranking("p1", 1, 30.0, 7.0),
            ranking("p2", 2, 25.0, 7.0),
            ranking("p3", 3, 20.0, 7.0),
        ];

        // Strictly-greater comparison: the first maximal stddev wins.
        let (first, second) = matchmaker.propose_pairing(&rankings).unwrap();
        assert_eq!(first, "p1");
        assert_eq!(second, "p2");
    }

    #[test]
    fn test_empty_rankings_error() {
        let matchmaker = UncertaintyMatchmaker::new();
        let err = matchmaker.propose_pairing(&[]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArenaError>(),
            Some(ArenaError::EmptyRankings)
        ));
    }

    #[test]
    fn test_single_ranking_cannot_pair() {
        let matchmaker = UncertaintyMatchmaker::new();
        let rankings = vec![ranking("p1", 1, 30.0, 5.0)];

        let err = matchmaker.propose_pairing(&rankings).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArenaError>(),
            Some(ArenaError::NotEnoughRankings { available: 1 })
        ));
    }
}
