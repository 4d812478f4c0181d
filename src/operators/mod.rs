//! Genetic operators over formulas

pub mod crossover;
pub mod mutation;
pub mod selection;
pub mod traits;

pub use crossover::SubtreeCrossover;
pub use mutation::PointMutation;
pub use selection::TournamentSelection;
pub use traits::{CrossoverOperator, MutationOperator, SelectionOperator};
