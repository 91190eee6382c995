//! Flattened operand chains for arithmetic and logical expressions.
//!
//! Both chains have the shape `arg0 op0 arg1 op1 ... argN` where every
//! operand is a leaf. They are folded strictly left to right: each operator
//! is applied to the running result and the next operand, with no
//! precedence grouping. `A + B * C` is `(A + B) * C`, and
//! `A > 1 && B > 2 || C > 3` is `((A > 1) && (B > 2)) || (C > 3)`.

use core::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::evaluator::operators::{apply_binary, apply_bool, compare_values};
use crate::leaf::LeafContent;
use crate::scope::{MathData, Synched};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BoolOp::And => "&&",
            BoolOp::Or => "||",
        }
    }
}

/// Relational test of one logical term.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compare {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Compare {
    pub fn symbol(self) -> &'static str {
        match self {
            Compare::Lt => "<",
            Compare::Le => "<=",
            Compare::Gt => ">",
            Compare::Ge => ">=",
            Compare::Eq => "==",
            Compare::Ne => "!=",
        }
    }
}

/// `arg0 op0 arg1 ... argN` over `+ - * /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryArgs {
    first: LeafContent,
    rest: SmallVec<[(BinaryOp, LeafContent); 2]>,
}

impl BinaryArgs {
    pub fn new(first: LeafContent) -> Self {
        Self {
            first,
            rest: SmallVec::new(),
        }
    }

    pub fn push(&mut self, op: BinaryOp, arg: LeafContent) {
        self.rest.push((op, arg));
    }

    pub fn with(mut self, op: BinaryOp, arg: LeafContent) -> Self {
        self.push(op, arg);
        self
    }

    pub fn first(&self) -> &LeafContent {
        &self.first
    }

    /// The `(operator, operand)` pairs after the first operand.
    pub fn rest(&self) -> &[(BinaryOp, LeafContent)] {
        &self.rest
    }

    /// Number of operands.
    pub fn len(&self) -> usize {
        self.rest.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn operands(&self) -> impl Iterator<Item = &LeafContent> {
        core::iter::once(&self.first).chain(self.rest.iter().map(|(_, arg)| arg))
    }

    /// Left-to-right fold at one point. Any missing operand, a division
    /// by zero, or a non-finite intermediate makes the result missing.
    pub fn value_at(&self, data: &dyn MathData, synched: &Synched, index: usize) -> Option<f64> {
        let mut acc = self.first.value_at(data, synched, index)?;
        for (op, arg) in &self.rest {
            let value = arg.value_at(data, synched, index)?;
            acc = apply_binary(*op, acc, value)?;
        }
        Some(acc)
    }
}

impl fmt::Display for BinaryArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first)?;
        for (op, arg) in &self.rest {
            write!(f, " {} {}", op.symbol(), arg)?;
        }
        Ok(())
    }
}

/// One relational test, `left CMP right`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalTerm {
    pub left: LeafContent,
    pub compare: Compare,
    pub right: LeafContent,
}

impl LogicalTerm {
    pub fn new(left: LeafContent, compare: Compare, right: LeafContent) -> Self {
        Self {
            left,
            compare,
            right,
        }
    }

    /// Truth of the term at one point.
    ///
    /// Against the `missing` keyword, `==` asks whether the left side is
    /// missing and `!=` whether it is present; other comparisons with
    /// `missing` are false. Otherwise a missing operand makes the term
    /// false.
    pub fn test_at(&self, data: &dyn MathData, synched: &Synched, index: usize) -> bool {
        let left = self.left.value_at(data, synched, index);
        if self.right.is_missing() || self.left.is_missing() {
            let other = if self.right.is_missing() {
                left
            } else {
                self.right.value_at(data, synched, index)
            };
            return match self.compare {
                Compare::Eq => other.is_none(),
                Compare::Ne => other.is_some(),
                _ => false,
            };
        }
        match (left, self.right.value_at(data, synched, index)) {
            (Some(l), Some(r)) => compare_values(self.compare, l, r),
            _ => false,
        }
    }
}

impl fmt::Display for LogicalTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.compare.symbol(), self.right)
    }
}

/// `term0 op0 term1 ... termN` over `&&` and `||`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalArgs {
    first: LogicalTerm,
    rest: SmallVec<[(BoolOp, LogicalTerm); 2]>,
}

impl LogicalArgs {
    pub fn new(first: LogicalTerm) -> Self {
        Self {
            first,
            rest: SmallVec::new(),
        }
    }

    pub fn push(&mut self, op: BoolOp, term: LogicalTerm) {
        self.rest.push((op, term));
    }

    pub fn with(mut self, op: BoolOp, term: LogicalTerm) -> Self {
        self.push(op, term);
        self
    }

    pub fn first(&self) -> &LogicalTerm {
        &self.first
    }

    pub fn rest(&self) -> &[(BoolOp, LogicalTerm)] {
        &self.rest
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.rest.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn terms(&self) -> impl Iterator<Item = &LogicalTerm> {
        core::iter::once(&self.first).chain(self.rest.iter().map(|(_, term)| term))
    }

    pub fn operands(&self) -> impl Iterator<Item = &LeafContent> {
        self.terms().flat_map(|term| [&term.left, &term.right])
    }

    /// Left-to-right fold of every term at one point.
    pub fn test_at(&self, data: &dyn MathData, synched: &Synched, index: usize) -> bool {
        let mut acc = self.first.test_at(data, synched, index);
        for (op, term) in &self.rest {
            acc = apply_bool(*op, acc, term.test_at(data, synched, index));
        }
        acc
    }
}

impl fmt::Display for LogicalArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first)?;
        for (op, term) in &self.rest {
            write!(f, " {} {}", op.symbol(), term)?;
        }
        Ok(())
    }
}
