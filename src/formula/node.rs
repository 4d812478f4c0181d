//! Suspiciousness-formula expression trees
//!
//! A formula is a closed expression tree over spectrum terminals, binary
//! arithmetic and unary protected operators. Nodes are addressed by preorder
//! child-index paths; structural edits go through [`ExprNode::replace_subtree`]
//! on an owned copy, so trees never share nodes.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::spectrum::SpectrumRecord;

/// Terminal symbols of the formula alphabet
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Terminal {
    /// Failing tests covering the element
    Ef,
    /// Passing tests covering the element
    Ep,
    /// Failing tests not covering the element
    Nf,
    /// Passing tests not covering the element
    Np,
    /// Failure-probability prior of the element
    FailProb,
    /// Numeric constant
    Const(f64),
}

impl Terminal {
    /// Draws a terminal uniformly; constants are drawn from `(0, 1]` and
    /// rounded to two decimals so rendered formulas stay readable.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        match rng.gen_range(0..6) {
            0 => Self::Ef,
            1 => Self::Ep,
            2 => Self::Nf,
            3 => Self::Np,
            4 => Self::FailProb,
            _ => {
                let c: f64 = rng.gen_range(0.01..=1.0);
                Self::Const((c * 100.0).round() / 100.0)
            }
        }
    }

    /// Reads the terminal's value out of a spectrum record.
    pub fn evaluate(&self, record: &SpectrumRecord) -> f64 {
        match self {
            Self::Ef => f64::from(record.e_f),
            Self::Ep => f64::from(record.e_p),
            Self::Nf => f64::from(record.n_f),
            Self::Np => f64::from(record.n_p),
            Self::FailProb => record.fail_prob,
            Self::Const(c) => *c,
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ef => write!(f, "e_f"),
            Self::Ep => write!(f, "e_p"),
            Self::Nf => write!(f, "n_f"),
            Self::Np => write!(f, "n_p"),
            Self::FailProb => write!(f, "p"),
            Self::Const(c) => write!(f, "{:.2}", c),
        }
    }
}

/// Binary arithmetic operators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// Protected division: a zero divisor yields 1.0
    Div,
}

impl BinaryOp {
    pub const ALL: [Self; 4] = [Self::Add, Self::Sub, Self::Mul, Self::Div];

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => {
                if b == 0.0 {
                    1.0
                } else {
                    a / b
                }
            }
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

/// Unary operators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Protected square root: sqrt of the absolute value
    Sqrt,
    Square,
}

impl UnaryOp {
    pub const ALL: [Self; 2] = [Self::Sqrt, Self::Square];

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Self::Sqrt => x.abs().sqrt(),
            Self::Square => x * x,
        }
    }
}

/// A node in a formula tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ExprNode {
    Terminal(Terminal),
    Binary(BinaryOp, Box<ExprNode>, Box<ExprNode>),
    Unary(UnaryOp, Box<ExprNode>),
}

impl ExprNode {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal(_))
    }

    /// Tree depth: a lone terminal has depth 1.
    pub fn depth(&self) -> usize {
        match self {
            Self::Terminal(_) => 1,
            Self::Binary(_, left, right) => 1 + left.depth().max(right.depth()),
            Self::Unary(_, child) => 1 + child.depth(),
        }
    }

    /// Total number of nodes.
    pub fn size(&self) -> usize {
        match self {
            Self::Terminal(_) => 1,
            Self::Binary(_, left, right) => 1 + left.size() + right.size(),
            Self::Unary(_, child) => 1 + child.size(),
        }
    }

    /// Evaluates the tree against one spectrum record.
    ///
    /// Total: protected operators guard division by zero and negative square
    /// roots, so this never panics. Overflow can still produce non-finite
    /// values; callers decide how to score those.
    pub fn evaluate(&self, record: &SpectrumRecord) -> f64 {
        match self {
            Self::Terminal(t) => t.evaluate(record),
            Self::Binary(op, left, right) => op.apply(left.evaluate(record), right.evaluate(record)),
            Self::Unary(op, child) => op.apply(child.evaluate(record)),
        }
    }

    /// All node positions in preorder, each as a child-index path from the
    /// root (the root is the empty path).
    pub fn positions(&self) -> Vec<Vec<usize>> {
        let mut out = Vec::with_capacity(self.size());
        self.collect_positions(&mut Vec::new(), &mut out);
        out
    }

    fn collect_positions(&self, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        out.push(current.clone());
        match self {
            Self::Terminal(_) => {}
            Self::Binary(_, left, right) => {
                current.push(0);
                left.collect_positions(current, out);
                current.pop();
                current.push(1);
                right.collect_positions(current, out);
                current.pop();
            }
            Self::Unary(_, child) => {
                current.push(0);
                child.collect_positions(current, out);
                current.pop();
            }
        }
    }

    /// Positions of terminal nodes only.
    pub fn terminal_positions(&self) -> Vec<Vec<usize>> {
        self.positions()
            .into_iter()
            .filter(|path| {
                self.get_subtree(path)
                    .map(|node| node.is_terminal())
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Positions of operator (non-terminal) nodes only.
    pub fn operator_positions(&self) -> Vec<Vec<usize>> {
        self.positions()
            .into_iter()
            .filter(|path| {
                self.get_subtree(path)
                    .map(|node| !node.is_terminal())
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Returns the subtree at the given path, if the path is valid.
    pub fn get_subtree(&self, path: &[usize]) -> Option<&ExprNode> {
        let mut node = self;
        for &index in path {
            node = match (node, index) {
                (Self::Binary(_, left, _), 0) => left,
                (Self::Binary(_, _, right), 1) => right,
                (Self::Unary(_, child), 0) => child,
                _ => return None,
            };
        }
        Some(node)
    }

    /// Replaces the subtree at the given path. Returns false and leaves the
    /// tree untouched when the path is invalid.
    pub fn replace_subtree(&mut self, path: &[usize], new_subtree: ExprNode) -> bool {
        if path.is_empty() {
            *self = new_subtree;
            return true;
        }
        let mut node = self;
        for &index in &path[..path.len() - 1] {
            node = match (node, index) {
                (Self::Binary(_, left, _), 0) => left,
                (Self::Binary(_, _, right), 1) => right,
                (Self::Unary(_, child), 0) => child,
                _ => return false,
            };
        }
        match (node, path[path.len() - 1]) {
            (Self::Binary(_, left, _), 0) => *left.as_mut() = new_subtree,
            (Self::Binary(_, _, right), 1) => *right.as_mut() = new_subtree,
            (Self::Unary(_, child), 0) => *child.as_mut() = new_subtree,
            _ => return false,
        }
        true
    }
}

impl fmt::Display for ExprNode {
    /// Fully parenthesized rendering, re-evaluable as a Python expression.
    /// Division carries an explicit zero guard; sqrt wraps its operand in
    /// `abs` so the text matches the protected tree semantics.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal(t) => write!(f, "{}", t),
            Self::Binary(BinaryOp::Div, left, right) => {
                write!(f, "(1 if {} == 0 else {} / {})", right, left, right)
            }
            Self::Binary(op, left, right) => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Self::Unary(UnaryOp::Sqrt, child) => write!(f, "sqrt(abs({}))", child),
            Self::Unary(UnaryOp::Square, child) => write!(f, "({} ** 2)", child),
        }
    }
}

/// A suspiciousness formula: an expression tree plus its depth bound.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    root: ExprNode,
    max_depth: usize,
}

impl Formula {
    /// Wraps a tree with a depth bound. The bound is a contract for the
    /// genetic operators; `new` does not reject deeper trees, the engine
    /// builder validates seeds against its configured bound.
    pub fn new(root: ExprNode, max_depth: usize) -> Self {
        Self { root, max_depth }
    }

    pub fn root(&self) -> &ExprNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut ExprNode {
        &mut self.root
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn size(&self) -> usize {
        self.root.size()
    }

    /// Scores one spectrum record.
    pub fn evaluate(&self, record: &SpectrumRecord) -> f64 {
        self.root.evaluate(record)
    }

    /// Renders the formula as re-evaluable text.
    pub fn render(&self) -> String {
        self.root.to_string()
    }

    /// Picks a uniformly random node path.
    pub fn random_position<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        let positions = self.root.positions();
        positions[rng.gen_range(0..positions.len())].clone()
    }

    /// Picks a random terminal path; every tree has at least one terminal.
    pub fn random_terminal_position<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        let positions = self.root.terminal_positions();
        positions[rng.gen_range(0..positions.len())].clone()
    }

    /// Picks a random operator path, None for a single-terminal tree.
    pub fn random_operator_position<R: Rng>(&self, rng: &mut R) -> Option<Vec<usize>> {
        let positions = self.root.operator_positions();
        if positions.is_empty() {
            None
        } else {
            Some(positions[rng.gen_range(0..positions.len())].clone())
        }
    }

    /// Structural distance used for population diversity: difference in size
    /// plus difference in depth.
    pub fn distance(&self, other: &Self) -> f64 {
        let size_diff = self.size().abs_diff(other.size());
        let depth_diff = self.depth().abs_diff(other.depth());
        (size_diff + depth_diff) as f64
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SpectrumRecord {
        SpectrumRecord::new(3, 1, 2, 10).with_fail_prob(0.5)
    }

    fn ef() -> ExprNode {
        ExprNode::Terminal(Terminal::Ef)
    }

    fn ep() -> ExprNode {
        ExprNode::Terminal(Terminal::Ep)
    }

    #[test]
    fn test_terminal_evaluation() {
        let r = record();
        assert_eq!(Terminal::Ef.evaluate(&r), 3.0);
        assert_eq!(Terminal::Ep.evaluate(&r), 1.0);
        assert_eq!(Terminal::Nf.evaluate(&r), 2.0);
        assert_eq!(Terminal::Np.evaluate(&r), 10.0);
        assert_eq!(Terminal::FailProb.evaluate(&r), 0.5);
        assert_eq!(Terminal::Const(0.7).evaluate(&r), 0.7);
    }

    #[test]
    fn test_protected_division() {
        assert_eq!(BinaryOp::Div.apply(5.0, 0.0), 1.0);
        assert_eq!(BinaryOp::Div.apply(5.0, 2.0), 2.5);
        assert_eq!(BinaryOp::Div.apply(0.0, 0.0), 1.0);
    }

    #[test]
    fn test_protected_sqrt() {
        assert_eq!(UnaryOp::Sqrt.apply(4.0), 2.0);
        assert_eq!(UnaryOp::Sqrt.apply(-4.0), 2.0);
        assert_eq!(UnaryOp::Sqrt.apply(0.0), 0.0);
    }

    #[test]
    fn test_square() {
        assert_eq!(UnaryOp::Square.apply(3.0), 9.0);
        assert_eq!(UnaryOp::Square.apply(-3.0), 9.0);
    }

    #[test]
    fn test_depth_and_size() {
        let tree = ExprNode::Binary(
            BinaryOp::Add,
            Box::new(ef()),
            Box::new(ExprNode::Unary(UnaryOp::Sqrt, Box::new(ep()))),
        );
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.size(), 4);
        assert_eq!(ef().depth(), 1);
        assert_eq!(ef().size(), 1);
    }

    #[test]
    fn test_positions_preorder() {
        let tree = ExprNode::Binary(BinaryOp::Add, Box::new(ef()), Box::new(ep()));
        let positions = tree.positions();
        assert_eq!(positions, vec![vec![], vec![0], vec![1]]);
        assert_eq!(tree.terminal_positions(), vec![vec![0], vec![1]]);
        assert_eq!(tree.operator_positions(), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_get_and_replace_subtree() {
        let mut tree = ExprNode::Binary(BinaryOp::Add, Box::new(ef()), Box::new(ep()));
        assert_eq!(tree.get_subtree(&[0]), Some(&ef()));
        assert_eq!(tree.get_subtree(&[2]), None);

        assert!(tree.replace_subtree(&[1], ExprNode::Terminal(Terminal::Np)));
        assert_eq!(tree.get_subtree(&[1]), Some(&ExprNode::Terminal(Terminal::Np)));

        assert!(!tree.replace_subtree(&[1, 0], ef()));
    }

    #[test]
    fn test_replace_root() {
        let mut tree = ef();
        assert!(tree.replace_subtree(&[], ep()));
        assert_eq!(tree, ep());
    }

    #[test]
    fn test_render_division_guard() {
        let tree = ExprNode::Binary(BinaryOp::Div, Box::new(ef()), Box::new(ep()));
        assert_eq!(tree.to_string(), "(1 if e_p == 0 else e_f / e_p)");
    }

    #[test]
    fn test_render_unary_and_constants() {
        let tree = ExprNode::Unary(
            UnaryOp::Sqrt,
            Box::new(ExprNode::Binary(
                BinaryOp::Mul,
                Box::new(ExprNode::Terminal(Terminal::Const(0.7))),
                Box::new(ExprNode::Unary(UnaryOp::Square, Box::new(ef()))),
            )),
        );
        assert_eq!(tree.to_string(), "sqrt(abs((0.70 * (e_f ** 2))))");
    }

    #[test]
    fn test_render_matches_clone() {
        let tree = ExprNode::Binary(
            BinaryOp::Sub,
            Box::new(ExprNode::Binary(BinaryOp::Div, Box::new(ef()), Box::new(ep()))),
            Box::new(ExprNode::Terminal(Terminal::FailProb)),
        );
        let copy = tree.clone();
        assert_eq!(tree.to_string(), copy.to_string());
        assert_eq!(tree, copy);
    }

    #[test]
    fn test_evaluation_of_composite_tree() {
        // (e_f / (e_f + n_f)) with e_f=3, n_f=2 => 0.6
        let tree = ExprNode::Binary(
            BinaryOp::Div,
            Box::new(ef()),
            Box::new(ExprNode::Binary(
                BinaryOp::Add,
                Box::new(ef()),
                Box::new(ExprNode::Terminal(Terminal::Nf)),
            )),
        );
        let value = tree.evaluate(&record());
        assert!((value - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_formula_distance() {
        let a = Formula::new(ef(), 4);
        let b = Formula::new(
            ExprNode::Binary(BinaryOp::Add, Box::new(ef()), Box::new(ep())),
            4,
        );
        assert_eq!(a.distance(&b), 3.0); // size diff 2 + depth diff 1
        assert_eq!(a.distance(&a), 0.0);
        assert_eq!(a.distance(&b), b.distance(&a));
    }
}
