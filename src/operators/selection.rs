//! Selection operators

use rand::seq::SliceRandom;
use rand::Rng;

use crate::formula::Formula;

use super::traits::SelectionOperator;

/// Tournament selection: draw `tournament_size` distinct candidates uniformly
/// without replacement, the one with the lowest penalty wins.
#[derive(Debug, Clone)]
pub struct TournamentSelection {
    tournament_size: usize,
}

impl TournamentSelection {
    pub fn new(tournament_size: usize) -> Self {
        assert!(tournament_size >= 1, "tournament size must be at least 1");
        Self { tournament_size }
    }

    /// Binary tournament.
    pub fn binary() -> Self {
        Self::new(2)
    }

    pub fn tournament_size(&self) -> usize {
        self.tournament_size
    }
}

impl Default for TournamentSelection {
    fn default() -> Self {
        Self::new(3)
    }
}

impl SelectionOperator for TournamentSelection {
    fn select<R: Rng>(&self, pool: &[(Formula, f64)], rng: &mut R) -> usize {
        let indices: Vec<usize> = (0..pool.len()).collect();
        let k = self.tournament_size.min(pool.len());
        indices
            .choose_multiple(rng, k)
            .copied()
            .min_by(|&a, &b| {
                pool[a]
                    .1
                    .partial_cmp(&pool[b].1)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(0)
    }
}
