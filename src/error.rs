//! Error types for sbfl-evo
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Error type for formula-tree operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormulaError {
    /// Invalid formula structure
    #[error("Invalid formula structure: {0}")]
    InvalidStructure(String),

    /// A tree exceeds its depth bound
    #[error("Formula depth {depth} exceeds bound {max_depth}")]
    DepthExceeded { depth: usize, max_depth: usize },

    /// A node path does not address any node in the tree
    #[error("No node at path {0:?}")]
    InvalidPath(Vec<usize>),
}

/// Error type for operator failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OperatorError {
    /// Crossover operation failed
    #[error("Crossover failed: {0}")]
    CrossoverFailed(String),

    /// Mutation operation failed
    #[error("Mutation failed: {0}")]
    MutationFailed(String),

    /// Selection operation failed
    #[error("Selection failed: {0}")]
    SelectionFailed(String),

    /// Invalid operator configuration
    #[error("Invalid operator configuration: {0}")]
    InvalidConfiguration(String),
}

/// Top-level error type for evolution operations
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// Formula error
    #[error("Formula error: {0}")]
    Formula(#[from] FormulaError),

    /// Operator error
    #[error("Operator error: {0}")]
    Operator(#[from] OperatorError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// No fault instances were supplied to the fitness function
    #[error("No fault instances supplied")]
    EmptyInstanceSet,

    /// Empty population
    #[error("Empty population")]
    EmptyPopulation,
}

/// Result type alias for evolution operations
pub type EvoResult<T> = Result<T, EvolutionError>;

/// Repair information when an operator needs to fix a constraint violation
#[derive(Debug, Clone)]
pub struct RepairInfo {
    /// List of constraint violations that were repaired
    pub constraint_violations: Vec<String>,
    /// Method used to repair the offspring
    pub repair_method: &'static str,
}

/// Result of an operator application with optional repair information
#[derive(Debug, Clone)]
pub enum OperatorResult<G> {
    /// Operation succeeded without repairs
    Success(G),
    /// Operation succeeded but required repairs
    Repaired(G, RepairInfo),
    /// Operation failed unrecoverably
    Failed(OperatorError),
}

impl<G> OperatorResult<G> {
    /// Returns the offspring if successful or repaired, None if failed
    pub fn genome(self) -> Option<G> {
        match self {
            Self::Success(g) | Self::Repaired(g, _) => Some(g),
            Self::Failed(_) => None,
        }
    }

    /// Returns true if the operation was successful (with or without repairs)
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    /// Returns true if repairs were needed
    pub fn was_repaired(&self) -> bool {
        matches!(self, Self::Repaired(_, _))
    }

    /// Maps the offspring type
    pub fn map<U, F: FnOnce(G) -> U>(self, f: F) -> OperatorResult<U> {
        match self {
            Self::Success(g) => OperatorResult::Success(f(g)),
            Self::Repaired(g, info) => OperatorResult::Repaired(f(g), info),
            Self::Failed(e) => OperatorResult::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_error_display() {
        let err = FormulaError::DepthExceeded {
            depth: 6,
            max_depth: 4,
        };
        assert_eq!(err.to_string(), "Formula depth 6 exceeds bound 4");

        let err = FormulaError::InvalidPath(vec![0, 1]);
        assert_eq!(err.to_string(), "No node at path [0, 1]");
    }

    #[test]
    fn test_operator_error_display() {
        let err = OperatorError::CrossoverFailed("no cut point".to_string());
        assert_eq!(err.to_string(), "Crossover failed: no cut point");

        let err =
            OperatorError::InvalidConfiguration("tournament size must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid operator configuration: tournament size must be positive"
        );
    }

    #[test]
    fn test_evolution_error_from_formula_error() {
        let formula_err = FormulaError::InvalidStructure("bad shape".to_string());
        let evo_err: EvolutionError = formula_err.into();
        assert!(matches!(evo_err, EvolutionError::Formula(_)));
    }

    #[test]
    fn test_operator_result_success() {
        let result: OperatorResult<i32> = OperatorResult::Success(42);
        assert!(result.is_ok());
        assert!(!result.was_repaired());
        assert_eq!(result.genome(), Some(42));
    }

    #[test]
    fn test_operator_result_repaired() {
        let repair_info = RepairInfo {
            constraint_violations: vec!["depth bound exceeded".to_string()],
            repair_method: "parent point mutation",
        };
        let result: OperatorResult<i32> = OperatorResult::Repaired(42, repair_info);
        assert!(result.is_ok());
        assert!(result.was_repaired());
        assert_eq!(result.genome(), Some(42));
    }

    #[test]
    fn test_operator_result_failed() {
        let result: OperatorResult<i32> =
            OperatorResult::Failed(OperatorError::MutationFailed("test".to_string()));
        assert!(!result.is_ok());
        assert!(!result.was_repaired());
        assert_eq!(result.genome(), None);
    }

    #[test]
    fn test_operator_result_map() {
        let result: OperatorResult<i32> = OperatorResult::Success(42);
        let mapped = result.map(|x| x * 2);
        assert_eq!(mapped.genome(), Some(84));
    }
}
