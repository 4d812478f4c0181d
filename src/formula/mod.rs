//! Formula representation: expression trees, generation, and baselines

pub mod catalog;
pub mod generate;
pub mod node;

pub use generate::{DEFAULT_TERMINAL_PROBABILITY, UNARY_PROBABILITY};
pub use node::{BinaryOp, ExprNode, Formula, Terminal, UnaryOp};
