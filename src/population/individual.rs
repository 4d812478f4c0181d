//! Individuals: a formula plus its evaluation state

use serde::{Deserialize, Serialize};

use crate::formula::Formula;

/// A population member: a formula, its fitness (penalty, lower is better)
/// once evaluated, and the generation it was created in.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Individual {
    pub formula: Formula,
    pub fitness: Option<f64>,
    pub birth_generation: usize,
}

impl Individual {
    pub fn new(formula: Formula) -> Self {
        Self {
            formula,
            fitness: None,
            birth_generation: 0,
        }
    }

    pub fn with_generation(formula: Formula, birth_generation: usize) -> Self {
        Self {
            formula,
            fitness: None,
            birth_generation,
        }
    }

    pub fn with_fitness(formula: Formula, fitness: f64) -> Self {
        Self {
            formula,
            fitness: Some(fitness),
            birth_generation: 0,
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = Some(fitness);
    }

    /// Fitness as a sortable penalty; unevaluated individuals sort last.
    pub fn fitness_or_worst(&self) -> f64 {
        self.fitness.unwrap_or(f64::INFINITY)
    }

    /// True when this individual has a strictly lower penalty than `other`.
    /// An evaluated individual always beats an unevaluated one.
    pub fn is_better_than(&self, other: &Self) -> bool {
        match (self.fitness, other.fitness) {
            (Some(a), Some(b)) => a < b,
            (Some(_), None) => true,
            _ => false,
        }
    }

    /// Generations survived since creation.
    pub fn age(&self, current_generation: usize) -> usize {
        current_generation.saturating_sub(self.birth_generation)
    }
}
