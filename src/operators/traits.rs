//! Operator traits for the evolutionary loop
//!
//! The engine is generic over these seams: any selection, crossover, or
//! mutation strategy over [`Formula`] plugs in.

use rand::Rng;

use crate::error::OperatorResult;
use crate::formula::Formula;

/// Selects a parent index from a pool of (formula, fitness) pairs.
///
/// Fitness is a penalty: lower values are better.
pub trait SelectionOperator: Send + Sync {
    fn select<R: Rng>(&self, pool: &[(Formula, f64)], rng: &mut R) -> usize;
}

/// Recombines two parent formulas into two offspring.
///
/// Implementations must keep offspring within the parents' depth bounds,
/// reporting any fallback through [`OperatorResult::Repaired`].
pub trait CrossoverOperator: Send + Sync {
    fn crossover<R: Rng>(
        &self,
        parent1: &Formula,
        parent2: &Formula,
        rng: &mut R,
    ) -> OperatorResult<(Formula, Formula)>;
}

/// Mutates a formula, returning a fresh tree.
///
/// The input is borrowed immutably: mutation always works on a structural
/// copy, never on a tree another individual may hold.
pub trait MutationOperator: Send + Sync {
    fn mutate<R: Rng>(&self, formula: &Formula, rng: &mut R) -> Formula;
}
