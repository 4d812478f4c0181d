//! # sbfl-evo
//!
//! Genetic-programming discovery of suspiciousness formulas for
//! spectrum-based fault localization (SBFL).
//!
//! A formula is an expression tree over per-element coverage counts
//! (`e_f`, `e_p`, `n_f`, `n_p`) and an optional failure-probability prior.
//! The engine evolves a population of such trees against a set of fault
//! instances, minimizing the mean rank at which the known faulty elements
//! appear when elements are sorted by descending suspiciousness.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use sbfl_evo::prelude::*;
//!
//! let fitness = RankFitness::new(instances)?;
//! let mut engine = GpBuilder::new()
//!     .population_size(40)
//!     .max_depth(4)
//!     .elite_count(2)
//!     .selection(TournamentSelection::default())
//!     .crossover(SubtreeCrossover::new())
//!     .mutation(PointMutation::default())
//!     .fitness(fitness)
//!     .max_generations(100)
//!     .build()?;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let result = engine.run(&mut rng)?;
//! println!("{} (fitness {})", result.rendered(), result.best_fitness);
//! ```
//!
//! ## Design notes
//!
//! - Fitness is a penalty: lower is better, and the engine minimizes.
//! - All randomness flows through one caller-owned [`rand::Rng`]; the same
//!   seed and configuration reproduce the same best formula.
//! - Protected arithmetic (division by zero yields 1, sqrt of the absolute
//!   value) keeps evaluation total; non-finite scores are penalized at the
//!   fitness boundary instead of crashing the run.
//! - Rendered formulas are fully parenthesized, re-evaluable expressions
//!   with explicit zero guards, for consumption by external scoring tools.

pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod fitness;
pub mod formula;
pub mod operators;
pub mod population;
pub mod spectrum;
pub mod termination;

/// Commonly used types
pub mod prelude {
    pub use crate::diagnostics::{EvolutionResult, EvolutionStats, GenerationStats};
    pub use crate::engine::{GpBuilder, GpConfig, GpEngine};
    pub use crate::error::{EvoResult, EvolutionError, OperatorResult};
    pub use crate::fitness::{AccuracyReport, Fitness, RankFitness};
    pub use crate::formula::{catalog, BinaryOp, ExprNode, Formula, Terminal, UnaryOp};
    pub use crate::operators::{
        CrossoverOperator, MutationOperator, PointMutation, SelectionOperator, SubtreeCrossover,
        TournamentSelection,
    };
    pub use crate::population::{Individual, Population};
    pub use crate::spectrum::{FaultInstance, SpectrumRecord};
    pub use crate::termination::{
        AnyOf, FitnessStagnation, MaxGenerations, TargetFitness, TerminationCriterion,
    };
}
