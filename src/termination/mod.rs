//! Termination criteria
//!
//! The engine consults a [`TerminationCriterion`] at the top of every
//! generation. Fitness is a penalty, so targets and improvements are
//! expressed in the minimizing direction.

use crate::population::Population;

/// Snapshot of the run handed to termination criteria.
pub struct EvolutionState<'a> {
    pub generation: usize,
    pub evaluations: usize,
    pub best_fitness: Option<f64>,
    pub population: &'a Population,
    /// Best fitness per completed generation, oldest first.
    pub fitness_history: &'a [f64],
}

pub trait TerminationCriterion: Send + Sync {
    fn should_terminate(&self, state: &EvolutionState<'_>) -> bool;

    /// Human-readable reason, used in run statistics.
    fn reason(&self) -> String;
}

/// Stop after a fixed number of generations.
#[derive(Debug, Clone)]
pub struct MaxGenerations {
    max: usize,
}

impl MaxGenerations {
    pub fn new(max: usize) -> Self {
        Self { max }
    }
}

impl TerminationCriterion for MaxGenerations {
    fn should_terminate(&self, state: &EvolutionState<'_>) -> bool {
        state.generation >= self.max
    }

    fn reason(&self) -> String {
        format!("reached maximum of {} generations", self.max)
    }
}

/// Stop once the best penalty falls to the target (within tolerance).
#[derive(Debug, Clone)]
pub struct TargetFitness {
    target: f64,
    tolerance: f64,
}

impl TargetFitness {
    pub fn new(target: f64) -> Self {
        Self {
            target,
            tolerance: 1e-9,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl TerminationCriterion for TargetFitness {
    fn should_terminate(&self, state: &EvolutionState<'_>) -> bool {
        state
            .best_fitness
            .is_some_and(|best| best <= self.target + self.tolerance)
    }

    fn reason(&self) -> String {
        format!("best fitness reached target {}", self.target)
    }
}

/// Stop when the best penalty has not improved by more than `epsilon` over
/// the last `window` generations.
#[derive(Debug, Clone)]
pub struct FitnessStagnation {
    window: usize,
    epsilon: f64,
}

impl FitnessStagnation {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1);
        Self {
            window,
            epsilon: 1e-9,
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }
}

impl TerminationCriterion for FitnessStagnation {
    fn should_terminate(&self, state: &EvolutionState<'_>) -> bool {
        let history = state.fitness_history;
        if history.len() <= self.window {
            return false;
        }
        let current = history[history.len() - 1];
        let past = history[history.len() - 1 - self.window];
        // Improvement means the penalty went down.
        past - current < self.epsilon
    }

    fn reason(&self) -> String {
        format!("no improvement over {} generations", self.window)
    }
}

/// Stop when any of the wrapped criteria fires.
pub struct AnyOf {
    criteria: Vec<Box<dyn TerminationCriterion>>,
}

impl AnyOf {
    pub fn new(criteria: Vec<Box<dyn TerminationCriterion>>) -> Self {
        Self { criteria }
    }
}

impl TerminationCriterion for AnyOf {
    fn should_terminate(&self, state: &EvolutionState<'_>) -> bool {
        self.criteria.iter().any(|c| c.should_terminate(state))
    }

    fn reason(&self) -> String {
        self.criteria
            .iter()
            .map(|c| c.reason())
            .collect::<Vec<_>>()
            .join(" or ")
    }
}
