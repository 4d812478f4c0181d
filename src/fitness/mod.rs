//! Fitness evaluation
//!
//! Fitness is a penalty over formulas: lower is better, and the engine
//! minimizes. Evaluation itself is pure; per-generation state (such as
//! instance sampling) changes only at the generation barrier through
//! [`Fitness::begin_generation`].

pub mod rank;

pub use rank::{AccuracyReport, RankFitness};

use crate::formula::Formula;

/// A fitness function over formulas.
pub trait Fitness: Send + Sync {
    /// Called once before any individual of a generation is scored.
    /// Implementations that sample their workload re-draw it here so every
    /// individual in the generation sees the same data.
    fn begin_generation(&mut self, _generation: usize) {}

    /// Penalty for a formula; lower is better. Must be pure so parallel
    /// evaluation cannot change results.
    fn evaluate(&self, formula: &Formula) -> f64;
}
