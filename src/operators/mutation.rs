//! Mutation operators

use rand::Rng;

use crate::formula::{
    BinaryOp, ExprNode, Formula, Terminal, UnaryOp, DEFAULT_TERMINAL_PROBABILITY,
};

use super::traits::MutationOperator;

/// Point mutation: each node mutates independently with `probability`.
///
/// A mutated terminal becomes a fresh random terminal. A mutated operator
/// node gets a fresh operator kind of the same arity, and each child is
/// regenerated (grow, within the remaining depth budget) with
/// `regenerate_probability`, otherwise kept. The depth bound cannot be
/// exceeded because regenerated subtrees only use the budget the old child
/// position had.
#[derive(Debug, Clone)]
pub struct PointMutation {
    probability: f64,
    regenerate_probability: f64,
}

impl PointMutation {
    pub fn new(probability: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&probability),
            "mutation probability must be in [0, 1]"
        );
        Self {
            probability,
            regenerate_probability: 0.5,
        }
    }

    pub fn with_regenerate_probability(mut self, regenerate_probability: f64) -> Self {
        assert!((0.0..=1.0).contains(&regenerate_probability));
        self.regenerate_probability = regenerate_probability;
        self
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    fn mutate_node<R: Rng>(
        &self,
        node: &mut ExprNode,
        level: usize,
        max_depth: usize,
        rng: &mut R,
    ) {
        if rng.gen::<f64>() < self.probability {
            // Children of an operator at `level` may use max_depth - level levels.
            let budget = max_depth.saturating_sub(level);
            match node {
                ExprNode::Terminal(t) => *t = Terminal::random(rng),
                ExprNode::Binary(op, left, right) => {
                    *op = BinaryOp::random(rng);
                    if budget >= 1 {
                        if rng.gen::<f64>() < self.regenerate_probability {
                            **left =
                                ExprNode::random_grow(rng, budget, DEFAULT_TERMINAL_PROBABILITY);
                        }
                        if rng.gen::<f64>() < self.regenerate_probability {
                            **right =
                                ExprNode::random_grow(rng, budget, DEFAULT_TERMINAL_PROBABILITY);
                        }
                    }
                }
                ExprNode::Unary(op, child) => {
                    *op = UnaryOp::random(rng);
                    if budget >= 1 && rng.gen::<f64>() < self.regenerate_probability {
                        **child = ExprNode::random_grow(rng, budget, DEFAULT_TERMINAL_PROBABILITY);
                    }
                }
            }
        }
        match node {
            ExprNode::Terminal(_) => {}
            ExprNode::Binary(_, left, right) => {
                self.mutate_node(left, level + 1, max_depth, rng);
                self.mutate_node(right, level + 1, max_depth, rng);
            }
            ExprNode::Unary(_, child) => self.mutate_node(child, level + 1, max_depth, rng),
        }
    }
}

impl Default for PointMutation {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl MutationOperator for PointMutation {
    fn mutate<R: Rng>(&self, formula: &Formula, rng: &mut R) -> Formula {
        let mut out = formula.clone();
        let max_depth = out.max_depth();
        self.mutate_node(out.root_mut(), 1, max_depth, rng);
        debug_assert!(out.depth() <= max_depth);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_mutation_leaves_original_untouched() {
        let mut rng = StdRng::seed_from_u64(5);
        let original = Formula::generate_full(&mut rng, 3, 4);
        let snapshot = original.clone();
        let mutation = PointMutation::new(1.0);
        let _ = mutation.mutate(&original, &mut rng);
        assert_eq!(original, snapshot);
    }

    #[test]
    fn test_mutation_respects_depth_bound() {
        let mut rng = StdRng::seed_from_u64(6);
        let mutation = PointMutation::new(0.5);
        for _ in 0..200 {
            let formula = Formula::generate_ramped(&mut rng, 4);
            let mutated = mutation.mutate(&formula, &mut rng);
            assert!(mutated.depth() <= 4, "{} too deep", mutated);
        }
    }

    #[test]
    fn test_zero_probability_is_identity() {
        let mut rng = StdRng::seed_from_u64(7);
        let formula = Formula::generate_full(&mut rng, 3, 4);
        let mutation = PointMutation::new(0.0);
        let mutated = mutation.mutate(&formula, &mut rng);
        assert_eq!(formula, mutated);
    }

    #[test]
    fn test_full_probability_changes_trees() {
        // With per-node probability 1 and forced regeneration, a depth-3
        // full tree virtually never survives intact over many attempts.
        let mut rng = StdRng::seed_from_u64(8);
        let mutation = PointMutation::new(1.0).with_regenerate_probability(1.0);
        let mut changed = 0;
        for _ in 0..20 {
            let formula = Formula::generate_full(&mut rng, 3, 4);
            if mutation.mutate(&formula, &mut rng) != formula {
                changed += 1;
            }
        }
        assert!(changed >= 19);
    }

    #[test]
    #[should_panic(expected = "mutation probability")]
    fn test_invalid_probability_panics() {
        PointMutation::new(1.5);
    }
}
