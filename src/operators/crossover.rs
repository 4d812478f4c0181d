//! Crossover operators

use rand::Rng;

use crate::error::{OperatorResult, RepairInfo};
use crate::formula::Formula;

use super::mutation::PointMutation;
use super::traits::{CrossoverOperator, MutationOperator};

/// Subtree crossover with biased cut points.
///
/// Each parent contributes one cut point: a terminal with probability
/// `terminal_bias`, otherwise an internal operator node. The subtrees at the
/// cut points are swapped by copy. An offspring that would exceed its depth
/// bound is discarded and replaced by a point mutation of the corresponding
/// original parent; trees are never truncated. That fallback is reported as
/// [`OperatorResult::Repaired`].
#[derive(Debug, Clone)]
pub struct SubtreeCrossover {
    terminal_bias: f64,
    fallback: PointMutation,
}

impl SubtreeCrossover {
    pub fn new() -> Self {
        Self {
            terminal_bias: 0.2,
            fallback: PointMutation::default(),
        }
    }

    pub fn with_terminal_bias(mut self, terminal_bias: f64) -> Self {
        assert!((0.0..=1.0).contains(&terminal_bias));
        self.terminal_bias = terminal_bias;
        self
    }

    /// Mutation used when an offspring breaks the depth bound.
    pub fn with_fallback(mut self, fallback: PointMutation) -> Self {
        self.fallback = fallback;
        self
    }

    fn pick_cut_point<R: Rng>(&self, formula: &Formula, rng: &mut R) -> Vec<usize> {
        if rng.gen::<f64>() < self.terminal_bias {
            formula.random_terminal_position(rng)
        } else {
            // A single-terminal tree has no operator nodes.
            formula
                .random_operator_position(rng)
                .unwrap_or_else(|| formula.random_terminal_position(rng))
        }
    }
}

impl Default for SubtreeCrossover {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossoverOperator for SubtreeCrossover {
    fn crossover<R: Rng>(
        &self,
        parent1: &Formula,
        parent2: &Formula,
        rng: &mut R,
    ) -> OperatorResult<(Formula, Formula)> {
        let cut1 = self.pick_cut_point(parent1, rng);
        let cut2 = self.pick_cut_point(parent2, rng);

        // Cut points come from the parents' own position lists, so the
        // subtrees exist; clone before either child is edited.
        let subtree1 = match parent1.root().get_subtree(&cut1) {
            Some(node) => node.clone(),
            None => {
                return OperatorResult::Failed(crate::error::OperatorError::CrossoverFailed(
                    format!("invalid cut point {:?}", cut1),
                ))
            }
        };
        let subtree2 = match parent2.root().get_subtree(&cut2) {
            Some(node) => node.clone(),
            None => {
                return OperatorResult::Failed(crate::error::OperatorError::CrossoverFailed(
                    format!("invalid cut point {:?}", cut2),
                ))
            }
        };

        let mut child1 = parent1.clone();
        child1.root_mut().replace_subtree(&cut1, subtree2);
        let mut child2 = parent2.clone();
        child2.root_mut().replace_subtree(&cut2, subtree1);

        let mut violations = Vec::new();
        let child1 = if child1.depth() <= parent1.max_depth() {
            child1
        } else {
            violations.push(format!(
                "offspring depth {} exceeds bound {}",
                child1.depth(),
                parent1.max_depth()
            ));
            self.fallback.mutate(parent1, rng)
        };
        let child2 = if child2.depth() <= parent2.max_depth() {
            child2
        } else {
            violations.push(format!(
                "offspring depth {} exceeds bound {}",
                child2.depth(),
                parent2.max_depth()
            ));
            self.fallback.mutate(parent2, rng)
        };

        if violations.is_empty() {
            OperatorResult::Success((child1, child2))
        } else {
            OperatorResult::Repaired(
                (child1, child2),
                RepairInfo {
                    constraint_violations: violations,
                    repair_method: "parent point mutation",
                },
            )
        }
    }
}
