//! Evolution driver
//!
//! A generational GP loop: elitist carry-over by copy, tournament selection,
//! subtree crossover, point mutation, and best-ever tracking. The driver owns
//! the only RNG; fitness evaluation is pure, so the parallel evaluation path
//! does not affect reproducibility.

use std::time::Instant;

use rand::Rng;
use tracing::{debug, info};

use crate::diagnostics::{EvolutionResult, EvolutionStats, GenerationStats, TimingStats};
use crate::error::{EvolutionError, EvoResult};
use crate::fitness::Fitness;
use crate::formula::Formula;
use crate::operators::traits::{CrossoverOperator, MutationOperator, SelectionOperator};
use crate::population::{Individual, Population};
use crate::termination::{EvolutionState, MaxGenerations, TerminationCriterion};

/// Configuration for the GP engine
#[derive(Clone, Debug)]
pub struct GpConfig {
    /// Population size
    pub population_size: usize,
    /// Depth bound for every tree in the run
    pub max_depth: usize,
    /// Number of elite individuals copied into each new generation
    pub elite_count: usize,
    /// Probability of crossover per parent pair
    pub crossover_probability: f64,
    /// Whether to evaluate in parallel
    pub parallel_evaluation: bool,
}

impl Default for GpConfig {
    fn default() -> Self {
        Self {
            population_size: 40,
            max_depth: 4,
            elite_count: 2,
            crossover_probability: 0.9,
            parallel_evaluation: true,
        }
    }
}

/// Builder for [`GpEngine`]
pub struct GpBuilder<S, C, M, Fit, Term> {
    config: GpConfig,
    seeds: Vec<Formula>,
    selection: Option<S>,
    crossover: Option<C>,
    mutation: Option<M>,
    fitness: Option<Fit>,
    termination: Option<Term>,
}

impl GpBuilder<(), (), (), (), ()> {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: GpConfig::default(),
            seeds: Vec::new(),
            selection: None,
            crossover: None,
            mutation: None,
            fitness: None,
            termination: None,
        }
    }
}

impl Default for GpBuilder<(), (), (), (), ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, C, M, Fit, Term> GpBuilder<S, C, M, Fit, Term> {
    /// Set the population size
    pub fn population_size(mut self, size: usize) -> Self {
        self.config.population_size = size;
        self
    }

    /// Set the tree depth bound
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Set the number of elites copied into each generation
    pub fn elite_count(mut self, count: usize) -> Self {
        self.config.elite_count = count;
        self
    }

    /// Set the crossover probability
    pub fn crossover_probability(mut self, probability: f64) -> Self {
        self.config.crossover_probability = probability;
        self
    }

    /// Enable or disable parallel evaluation
    pub fn parallel_evaluation(mut self, enabled: bool) -> Self {
        self.config.parallel_evaluation = enabled;
        self
    }

    /// Add a hand-authored formula to the initial population
    pub fn seed(mut self, formula: Formula) -> Self {
        self.seeds.push(formula);
        self
    }

    /// Add several seed formulas
    pub fn seeds(mut self, formulas: impl IntoIterator<Item = Formula>) -> Self {
        self.seeds.extend(formulas);
        self
    }

    /// Set the selection operator
    pub fn selection<NewS>(self, selection: NewS) -> GpBuilder<NewS, C, M, Fit, Term>
    where
        NewS: SelectionOperator,
    {
        GpBuilder {
            config: self.config,
            seeds: self.seeds,
            selection: Some(selection),
            crossover: self.crossover,
            mutation: self.mutation,
            fitness: self.fitness,
            termination: self.termination,
        }
    }

    /// Set the crossover operator
    pub fn crossover<NewC>(self, crossover: NewC) -> GpBuilder<S, NewC, M, Fit, Term>
    where
        NewC: CrossoverOperator,
    {
        GpBuilder {
            config: self.config,
            seeds: self.seeds,
            selection: self.selection,
            crossover: Some(crossover),
            mutation: self.mutation,
            fitness: self.fitness,
            termination: self.termination,
        }
    }

    /// Set the mutation operator
    pub fn mutation<NewM>(self, mutation: NewM) -> GpBuilder<S, C, NewM, Fit, Term>
    where
        NewM: MutationOperator,
    {
        GpBuilder {
            config: self.config,
            seeds: self.seeds,
            selection: self.selection,
            crossover: self.crossover,
            mutation: Some(mutation),
            fitness: self.fitness,
            termination: self.termination,
        }
    }

    /// Set the fitness function
    pub fn fitness<NewFit>(self, fitness: NewFit) -> GpBuilder<S, C, M, NewFit, Term>
    where
        NewFit: Fitness,
    {
        GpBuilder {
            config: self.config,
            seeds: self.seeds,
            selection: self.selection,
            crossover: self.crossover,
            mutation: self.mutation,
            fitness: Some(fitness),
            termination: self.termination,
        }
    }

    /// Set the termination criterion
    pub fn termination<NewTerm>(self, termination: NewTerm) -> GpBuilder<S, C, M, Fit, NewTerm>
    where
        NewTerm: TerminationCriterion,
    {
        GpBuilder {
            config: self.config,
            seeds: self.seeds,
            selection: self.selection,
            crossover: self.crossover,
            mutation: self.mutation,
            fitness: self.fitness,
            termination: Some(termination),
        }
    }

    /// Set max generations (convenience method)
    pub fn max_generations(self, max: usize) -> GpBuilder<S, C, M, Fit, MaxGenerations> {
        GpBuilder {
            config: self.config,
            seeds: self.seeds,
            selection: self.selection,
            crossover: self.crossover,
            mutation: self.mutation,
            fitness: self.fitness,
            termination: Some(MaxGenerations::new(max)),
        }
    }
}

impl<S, C, M, Fit, Term> GpBuilder<S, C, M, Fit, Term>
where
    S: SelectionOperator,
    C: CrossoverOperator,
    M: MutationOperator,
    Fit: Fitness,
    Term: TerminationCriterion,
{
    /// Build the engine, validating the configuration.
    pub fn build(self) -> EvoResult<GpEngine<S, C, M, Fit, Term>> {
        if self.config.population_size < 2 {
            return Err(EvolutionError::Configuration(
                "population size must be at least 2".to_string(),
            ));
        }
        if self.config.elite_count >= self.config.population_size {
            return Err(EvolutionError::Configuration(format!(
                "elite count {} must be below population size {}",
                self.config.elite_count, self.config.population_size
            )));
        }
        if self.config.max_depth < 2 {
            return Err(EvolutionError::Configuration(
                "max depth must be at least 2".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.config.crossover_probability) {
            return Err(EvolutionError::Configuration(
                "crossover probability must be in [0, 1]".to_string(),
            ));
        }
        for seed in &self.seeds {
            if seed.depth() > self.config.max_depth {
                return Err(EvolutionError::Configuration(format!(
                    "seed formula depth {} exceeds max depth {}",
                    seed.depth(),
                    self.config.max_depth
                )));
            }
        }

        let selection = self.selection.ok_or_else(|| {
            EvolutionError::Configuration("selection operator must be specified".to_string())
        })?;
        let crossover = self.crossover.ok_or_else(|| {
            EvolutionError::Configuration("crossover operator must be specified".to_string())
        })?;
        let mutation = self.mutation.ok_or_else(|| {
            EvolutionError::Configuration("mutation operator must be specified".to_string())
        })?;
        let fitness = self.fitness.ok_or_else(|| {
            EvolutionError::Configuration("fitness function must be specified".to_string())
        })?;
        let termination = self.termination.ok_or_else(|| {
            EvolutionError::Configuration("termination criterion must be specified".to_string())
        })?;

        Ok(GpEngine {
            config: self.config,
            seeds: self.seeds,
            selection,
            crossover,
            mutation,
            fitness,
            termination,
        })
    }
}

/// Generational GP engine over suspiciousness formulas
pub struct GpEngine<S, C, M, Fit, Term> {
    config: GpConfig,
    seeds: Vec<Formula>,
    selection: S,
    crossover: C,
    mutation: M,
    fitness: Fit,
    termination: Term,
}

impl GpEngine<(), (), (), (), ()> {
    /// Create a builder
    pub fn builder() -> GpBuilder<(), (), (), (), ()> {
        GpBuilder::new()
    }
}

impl<S, C, M, Fit, Term> GpEngine<S, C, M, Fit, Term>
where
    S: SelectionOperator,
    C: CrossoverOperator,
    M: MutationOperator,
    Fit: Fitness,
    Term: TerminationCriterion,
{
    pub fn config(&self) -> &GpConfig {
        &self.config
    }

    fn evaluate_population(&self, population: &mut Population) -> usize {
        #[cfg(feature = "parallel")]
        if self.config.parallel_evaluation {
            return population.evaluate_parallel(&self.fitness);
        }
        population.evaluate(&self.fitness)
    }

    /// Run the search to termination.
    ///
    /// Takes `&mut self` because the fitness function may re-draw its
    /// instance sample at each generation barrier.
    pub fn run<R: Rng>(&mut self, rng: &mut R) -> EvoResult<EvolutionResult> {
        let start_time = Instant::now();

        let mut population = Population::seeded(
            self.config.population_size,
            self.config.max_depth,
            &self.seeds,
            rng,
        );

        self.fitness.begin_generation(0);
        let eval_start = Instant::now();
        let mut evaluations = self.evaluate_population(&mut population);
        let eval_ms = eval_start.elapsed().as_secs_f64() * 1000.0;

        let mut stats = EvolutionStats::new();
        let mut fitness_history: Vec<f64> = Vec::new();

        let mut best_individual = population
            .best()
            .ok_or(EvolutionError::EmptyPopulation)?
            .clone();

        let gen_stats = GenerationStats::from_population(&population, evaluations).with_timing(
            TimingStats {
                evaluation_ms: eval_ms,
                reproduction_ms: 0.0,
                total_ms: eval_ms,
            },
        );
        fitness_history.push(gen_stats.best_fitness.unwrap_or(f64::INFINITY));
        stats.record(gen_stats);

        loop {
            let state = EvolutionState {
                generation: population.generation(),
                evaluations,
                best_fitness: best_individual.fitness,
                population: &population,
                fitness_history: &fitness_history,
            };

            if self.termination.should_terminate(&state) {
                stats.set_termination_reason(self.termination.reason());
                break;
            }

            let gen_start = Instant::now();
            let next_generation = population.generation() + 1;

            let mut new_population = Population::with_capacity(self.config.population_size);

            // Elites carried by value; their fitness survives re-evaluation
            // because already-evaluated individuals are skipped.
            {
                let mut sorted = population.clone();
                sorted.sort_by_fitness();
                for i in 0..self.config.elite_count.min(sorted.len()) {
                    new_population.push(sorted[i].clone());
                }
            }

            let selection_pool = population.as_fitness_pairs();
            if selection_pool.is_empty() {
                return Err(EvolutionError::EmptyPopulation);
            }

            while new_population.len() < self.config.population_size {
                let parent1 = &selection_pool[self.selection.select(&selection_pool, rng)].0;
                let parent2 = &selection_pool[self.selection.select(&selection_pool, rng)].0;

                let (child1, child2) = if rng.gen::<f64>() < self.config.crossover_probability {
                    let result = self.crossover.crossover(parent1, parent2, rng);
                    if result.was_repaired() {
                        debug!(
                            generation = next_generation,
                            "crossover offspring repaired"
                        );
                    }
                    match result.genome() {
                        Some((c1, c2)) => (c1, c2),
                        None => (parent1.clone(), parent2.clone()),
                    }
                } else {
                    (parent1.clone(), parent2.clone())
                };

                let child1 = self.mutation.mutate(&child1, rng);
                let child2 = self.mutation.mutate(&child2, rng);

                new_population.push(Individual::with_generation(child1, next_generation));
                if new_population.len() < self.config.population_size {
                    new_population.push(Individual::with_generation(child2, next_generation));
                }
            }
            new_population.truncate(self.config.population_size);
            new_population.set_generation(next_generation);
            let reproduction_ms = gen_start.elapsed().as_secs_f64() * 1000.0;

            // Generation barrier: sampling fitness functions re-draw here so
            // all individuals of the generation see the same instances.
            self.fitness.begin_generation(next_generation);
            let eval_start = Instant::now();
            evaluations += self.evaluate_population(&mut new_population);
            let eval_ms = eval_start.elapsed().as_secs_f64() * 1000.0;

            population = new_population;

            if let Some(best) = population.best() {
                if best.is_better_than(&best_individual) {
                    best_individual = best.clone();
                }
            }

            let gen_stats = GenerationStats::from_population(&population, evaluations)
                .with_timing(TimingStats {
                    evaluation_ms: eval_ms,
                    reproduction_ms,
                    total_ms: gen_start.elapsed().as_secs_f64() * 1000.0,
                });
            info!(
                generation = next_generation,
                best_fitness = gen_stats.best_fitness.unwrap_or(f64::INFINITY),
                best_formula = gen_stats.best_formula.as_str(),
                "generation complete"
            );
            fitness_history.push(gen_stats.best_fitness.unwrap_or(f64::INFINITY));
            stats.record(gen_stats);
        }

        stats.set_runtime(start_time.elapsed().as_secs_f64() * 1000.0);

        let best_fitness = best_individual.fitness_or_worst();
        Ok(EvolutionResult {
            best_formula: best_individual.formula,
            best_fitness,
            generations: population.generation(),
            evaluations,
            stats,
        })
    }
}
