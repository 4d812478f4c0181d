//! Run statistics and results
//!
//! Per-generation snapshots, whole-run aggregates, and the final result
//! returned by the engine. Everything serializes so downstream tooling can
//! consume traces.

use serde::Serialize;

use crate::formula::Formula;
use crate::population::Population;

/// Timing breakdown of one generation, in milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TimingStats {
    pub evaluation_ms: f64,
    pub reproduction_ms: f64,
    pub total_ms: f64,
}

/// Statistics for a single generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationStats {
    pub generation: usize,
    pub evaluations: usize,
    pub best_fitness: Option<f64>,
    pub worst_fitness: Option<f64>,
    pub mean_fitness: Option<f64>,
    pub fitness_std: Option<f64>,
    pub diversity: f64,
    /// Rendered best formula of the generation
    pub best_formula: String,
    pub timing: TimingStats,
}

impl GenerationStats {
    /// Snapshots an evaluated population.
    pub fn from_population(population: &Population, evaluations: usize) -> Self {
        Self {
            generation: population.generation(),
            evaluations,
            best_fitness: population.best().and_then(|i| i.fitness),
            worst_fitness: population.worst().and_then(|i| i.fitness),
            mean_fitness: population.mean_fitness(),
            fitness_std: population.fitness_std(),
            diversity: population.diversity(),
            best_formula: population
                .best()
                .map(|i| i.formula.render())
                .unwrap_or_default(),
            timing: TimingStats::default(),
        }
    }

    pub fn with_timing(mut self, timing: TimingStats) -> Self {
        self.timing = timing;
        self
    }
}

/// Statistics for an entire run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvolutionStats {
    pub generations: Vec<GenerationStats>,
    pub total_runtime_ms: f64,
    pub termination_reason: Option<String>,
}

impl EvolutionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stats: GenerationStats) {
        self.generations.push(stats);
    }

    pub fn num_generations(&self) -> usize {
        self.generations.len()
    }

    /// Lowest penalty seen across all recorded generations.
    pub fn best_fitness(&self) -> Option<f64> {
        self.generations
            .iter()
            .filter_map(|g| g.best_fitness)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    pub fn final_best_fitness(&self) -> Option<f64> {
        self.generations.last().and_then(|g| g.best_fitness)
    }

    /// Best penalty per generation, oldest first.
    pub fn best_fitness_history(&self) -> Vec<f64> {
        self.generations
            .iter()
            .filter_map(|g| g.best_fitness)
            .collect()
    }

    /// The best rendered formula of each generation.
    pub fn formula_trace(&self) -> Vec<(usize, &str)> {
        self.generations
            .iter()
            .map(|g| (g.generation, g.best_formula.as_str()))
            .collect()
    }

    pub fn set_termination_reason(&mut self, reason: String) {
        self.termination_reason = Some(reason);
    }

    pub fn set_runtime(&mut self, total_runtime_ms: f64) {
        self.total_runtime_ms = total_runtime_ms;
    }
}

/// Final result of a run.
#[derive(Debug, Clone, Serialize)]
pub struct EvolutionResult {
    /// Best-ever formula, tracked by copy across generations
    pub best_formula: Formula,
    /// Its penalty
    pub best_fitness: f64,
    pub generations: usize,
    pub evaluations: usize,
    pub stats: EvolutionStats,
}

impl EvolutionResult {
    /// The best formula as re-evaluable text.
    pub fn rendered(&self) -> String {
        self.best_formula.render()
    }
}
