//! Tree-walking evaluator for expression trees.
//!
//! Statements are processed against one scope at a time. Value-producing
//! nodes are evaluated point by point through an [`Evaluator`]; whole
//! statements go through [`Node::process`](crate::node::Node::process),
//! which resolves names, computes into a buffer, and commits only on
//! success.
//!
//! ## Design Principles
//!
//! - **Never panic**: malformed trees and absent fields become errors
//! - **Stack-safe**: depth tracking prevents stack overflow from deeply nested calls
//! - **Missing is a value**: absent data flows through operators, it is not an error
//!
//! ## Example
//!
//! ```
//! use radmath_core::evaluator::{EvaluatorOptions, evaluate_all};
//! use radmath_core::node::{BinaryArgs, BinaryOp, Node};
//! use radmath_core::leaf::LeafContent;
//! use radmath_core::scope::memory::{ArrayField, MemoryScope};
//!
//! let mut scope = MemoryScope::new();
//! scope
//!     .add_field(ArrayField::with_missing("A", vec![1.0, -9999.0, 3.0], -9999.0))
//!     .unwrap();
//!
//! let expr = Node::Binary(
//!     BinaryArgs::new(LeafContent::variable("A")).with(BinaryOp::Add, LeafContent::number(2.0)),
//! );
//! let values = evaluate_all(&expr, &scope, EvaluatorOptions::default()).unwrap();
//! assert_eq!(values, vec![Some(3.0), None, Some(5.0)]);
//! ```

mod error;
mod eval;
pub(crate) mod operators;
mod process;


pub use error::EvalError;
pub use eval::Evaluator;
pub use process::evaluate_all;
pub(crate) use process::{process_assignment, process_conditional};

/// Limits applied while evaluating one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatorOptions {
    /// Maximum evaluation stack depth (for recursion protection).
    ///
    /// Default: 1000
    pub max_depth: usize,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self { max_depth: 1000 }
    }
}
