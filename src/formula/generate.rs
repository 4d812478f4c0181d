//! Random tree generation
//!
//! Full, grow, and ramped half-and-half initialization over the formula
//! alphabet. All draws go through the caller's RNG, so generation is
//! reproducible from a seed.

use rand::Rng;

use super::node::{BinaryOp, ExprNode, Formula, Terminal, UnaryOp};

/// Probability of stopping at a terminal below the depth bound (grow policy).
pub const DEFAULT_TERMINAL_PROBABILITY: f64 = 0.3;

/// Probability of drawing a unary operator instead of a binary one.
pub const UNARY_PROBABILITY: f64 = 0.15;

impl ExprNode {
    /// Full policy: every path reaches exactly `depth` levels.
    pub fn random_full<R: Rng>(rng: &mut R, depth: usize) -> Self {
        if depth <= 1 {
            return Self::Terminal(Terminal::random(rng));
        }
        if rng.gen::<f64>() < UNARY_PROBABILITY {
            Self::Unary(
                UnaryOp::random(rng),
                Box::new(Self::random_full(rng, depth - 1)),
            )
        } else {
            Self::Binary(
                BinaryOp::random(rng),
                Box::new(Self::random_full(rng, depth - 1)),
                Box::new(Self::random_full(rng, depth - 1)),
            )
        }
    }

    /// Grow policy: below the budget a terminal is drawn with
    /// `terminal_probability`, at budget 1 always.
    pub fn random_grow<R: Rng>(rng: &mut R, depth: usize, terminal_probability: f64) -> Self {
        if depth <= 1 || rng.gen::<f64>() < terminal_probability {
            return Self::Terminal(Terminal::random(rng));
        }
        if rng.gen::<f64>() < UNARY_PROBABILITY {
            Self::Unary(
                UnaryOp::random(rng),
                Box::new(Self::random_grow(rng, depth - 1, terminal_probability)),
            )
        } else {
            Self::Binary(
                BinaryOp::random(rng),
                Box::new(Self::random_grow(rng, depth - 1, terminal_probability)),
                Box::new(Self::random_grow(rng, depth - 1, terminal_probability)),
            )
        }
    }
}

impl Formula {
    /// Generates a full tree of exactly `depth` levels, bounded by `max_depth`.
    pub fn generate_full<R: Rng>(rng: &mut R, depth: usize, max_depth: usize) -> Self {
        let depth = depth.min(max_depth);
        Self::new(ExprNode::random_full(rng, depth), max_depth)
    }

    /// Generates a grow tree within `depth` levels, bounded by `max_depth`.
    pub fn generate_grow<R: Rng>(
        rng: &mut R,
        depth: usize,
        max_depth: usize,
        terminal_probability: f64,
    ) -> Self {
        let depth = depth.min(max_depth);
        Self::new(
            ExprNode::random_grow(rng, depth, terminal_probability),
            max_depth,
        )
    }

    /// Ramped half-and-half: target depth uniform over `2..=max_depth`, then
    /// full or grow with equal probability.
    pub fn generate_ramped<R: Rng>(rng: &mut R, max_depth: usize) -> Self {
        let upper = max_depth.max(2);
        let depth = rng.gen_range(2..=upper);
        if rng.gen::<bool>() {
            Self::generate_full(rng, depth, max_depth)
        } else {
            Self::generate_grow(rng, depth, max_depth, DEFAULT_TERMINAL_PROBABILITY)
        }
    }
}
