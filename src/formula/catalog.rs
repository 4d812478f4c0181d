//! Hand-authored baseline formulas
//!
//! Classic SBFL formulas expressed as trees, usable as population seeds and
//! as comparison baselines. The depth bound of a catalog formula is its own
//! depth; the engine re-binds seeds to the configured bound.

use super::node::{BinaryOp, ExprNode, Formula, Terminal, UnaryOp};

fn terminal(t: Terminal) -> ExprNode {
    ExprNode::Terminal(t)
}

fn add(left: ExprNode, right: ExprNode) -> ExprNode {
    ExprNode::Binary(BinaryOp::Add, Box::new(left), Box::new(right))
}

fn div(left: ExprNode, right: ExprNode) -> ExprNode {
    ExprNode::Binary(BinaryOp::Div, Box::new(left), Box::new(right))
}

fn mul(left: ExprNode, right: ExprNode) -> ExprNode {
    ExprNode::Binary(BinaryOp::Mul, Box::new(left), Box::new(right))
}

fn sqrt(child: ExprNode) -> ExprNode {
    ExprNode::Unary(UnaryOp::Sqrt, Box::new(child))
}

/// Tarantula: `(e_f / (e_f + n_f)) / ((e_f / (e_f + n_f)) + (e_p / (e_p + n_p)))`
pub fn tarantula() -> Formula {
    let fail_ratio = || {
        div(
            terminal(Terminal::Ef),
            add(terminal(Terminal::Ef), terminal(Terminal::Nf)),
        )
    };
    let pass_ratio = div(
        terminal(Terminal::Ep),
        add(terminal(Terminal::Ep), terminal(Terminal::Np)),
    );
    let root = div(fail_ratio(), add(fail_ratio(), pass_ratio));
    let depth = root.depth();
    Formula::new(root, depth)
}

/// Ochiai: `e_f / sqrt((e_f + n_f) * (e_f + e_p))`
pub fn ochiai() -> Formula {
    let root = div(
        terminal(Terminal::Ef),
        sqrt(mul(
            add(terminal(Terminal::Ef), terminal(Terminal::Nf)),
            add(terminal(Terminal::Ef), terminal(Terminal::Ep)),
        )),
    );
    let depth = root.depth();
    Formula::new(root, depth)
}
