//! The expression tree.
//!
//! Every statement of a script becomes one tree whose root is an
//! [`AssignmentNode`] or a [`ConditionalNode`]. Trees are built once and
//! evaluated many times, once per scope instance. Interior nodes own their
//! children exclusively.
//!
//! ## Example
//!
//! ```
//! use radmath_core::leaf::LeafContent;
//! use radmath_core::node::{AssignmentNode, BinaryArgs, BinaryOp, Node};
//!
//! // SNR = DBZ - 5
//! let rhs = BinaryArgs::new(LeafContent::variable("DBZ"))
//!     .with(BinaryOp::Sub, LeafContent::number(5.0));
//! let stmt = AssignmentNode::new("SNR", Node::Binary(rhs)).unwrap();
//! assert_eq!(stmt.to_string(), "SNR = DBZ - 5");
//! ```

mod args;
mod unary;


pub use args::{BinaryArgs, BinaryOp, BoolOp, Compare, LogicalArgs, LogicalTerm};
pub use unary::{UnaryKind, UnaryNode, UnaryOp};

use core::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::evaluator::{self, EvalError, EvaluatorOptions};
use crate::leaf::LeafContent;
use crate::scope::{MathData, Synched};

/// One node of an expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// A variable, number, or `missing`.
    Leaf(LeafContent),

    /// A call to a built-in operator or a user function.
    Unary(UnaryNode),

    /// An arithmetic chain of leaves.
    Binary(BinaryArgs),

    /// A logical chain of relational tests; its value is 1 or 0.
    Logical(LogicalArgs),

    /// `target = value`.
    Assignment(AssignmentNode),

    /// `if (test) then A = x else B = y`.
    Conditional(ConditionalNode),
}

/// What a successful [`Node::process`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Processed {
    /// Fields created or overwritten in the scope.
    Fields(Vec<String>),
    /// A special user data entry stored under this name.
    UserData(String),
}

impl Processed {
    pub fn names(&self) -> Vec<&str> {
        match self {
            Processed::Fields(names) => names.iter().map(String::as_str).collect(),
            Processed::UserData(name) => vec![name.as_str()],
        }
    }
}

impl Node {
    pub fn variable(name: impl Into<String>) -> Self {
        Node::Leaf(LeafContent::variable(name))
    }

    pub fn number(value: f64) -> Self {
        Node::Leaf(LeafContent::number(value))
    }

    pub fn missing() -> Self {
        Node::Leaf(LeafContent::Missing)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Name of the field a variable leaf refers to.
    pub fn leaf_name(&self) -> Option<&str> {
        match self {
            Node::Leaf(leaf) => leaf.variable_name(),
            _ => None,
        }
    }

    /// Context-free value. Only number leaves have one; anything else is
    /// caller misuse and is reported as an error.
    pub fn constant_value(&self) -> Result<f64, EvalError> {
        match self {
            Node::Leaf(leaf) => leaf.constant_value(),
            other => {
                warn!(node = %other, "constant value requested from a non-leaf node");
                Err(EvalError::Misuse {
                    message: format!("'{}' is not a constant", other),
                })
            }
        }
    }

    pub fn is_user_function(&self) -> bool {
        matches!(self, Node::Unary(unary) if unary.is_user_function())
    }

    /// Keyword of a user function call node.
    pub fn user_unary_keyword(&self) -> Option<&str> {
        match self {
            Node::Unary(unary) => unary.user_keyword(),
            _ => None,
        }
    }

    /// Argument nodes of a call node.
    pub fn unary_args(&self) -> Option<&[Node]> {
        match self {
            Node::Unary(unary) => Some(unary.args()),
            _ => None,
        }
    }

    /// Every field name read by this node, in first-mention order, without
    /// duplicates. `missing` and numbers are not inputs.
    pub fn inputs(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_inputs(&mut names);
        names
    }

    pub(crate) fn collect_inputs(&self, names: &mut Vec<String>) {
        match self {
            Node::Leaf(leaf) => add(names, leaf),
            Node::Unary(unary) => unary.args().iter().for_each(|arg| arg.collect_inputs(names)),
            Node::Binary(args) => args.operands().for_each(|leaf| add(names, leaf)),
            Node::Logical(args) => args.operands().for_each(|leaf| add(names, leaf)),
            Node::Assignment(assign) => assign.value().collect_inputs(names),
            Node::Conditional(cond) => cond.collect_inputs(names),
        }
    }

    /// Every field (or user data) name written by this node.
    pub fn outputs(&self) -> Vec<String> {
        match self {
            Node::Assignment(assign) => vec![assign.target_name().to_string()],
            Node::Conditional(cond) => cond.outputs(),
            _ => Vec::new(),
        }
    }

    /// Value of a value-producing node at one point of `data`.
    ///
    /// Names are resolved on the fly; use [`Node::process`] or
    /// [`evaluator::Evaluator`] to resolve them once for a whole loop.
    pub fn value_at(&self, data: &dyn MathData, index: usize) -> Result<Option<f64>, EvalError> {
        let synched = Synched::default();
        evaluator::Evaluator::new(EvaluatorOptions::default(), data, &synched).value_at(self, index)
    }

    /// Values of a value-producing node at every point of `data`.
    pub fn values(
        &self,
        data: &dyn MathData,
        options: EvaluatorOptions,
    ) -> Result<Vec<Option<f64>>, EvalError> {
        evaluator::evaluate_all(self, data, options)
    }

    /// Run a statement against a whole scope.
    pub fn process(&self, data: &mut dyn MathData) -> Result<Processed, EvalError> {
        self.process_with(data, EvaluatorOptions::default())
    }

    pub fn process_with(
        &self,
        data: &mut dyn MathData,
        options: EvaluatorOptions,
    ) -> Result<Processed, EvalError> {
        match self {
            Node::Assignment(assign) => evaluator::process_assignment(assign, data, options),
            Node::Conditional(cond) => evaluator::process_conditional(cond, data, options),
            other => {
                warn!(node = %other, "only statements can be processed");
                Err(EvalError::Misuse {
                    message: format!("'{}' is not an assignment", other),
                })
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Leaf(leaf) => write!(f, "{}", leaf),
            Node::Unary(unary) => write!(f, "{}", unary),
            Node::Binary(args) => write!(f, "{}", args),
            Node::Logical(args) => write!(f, "{}", args),
            Node::Assignment(assign) => write!(f, "{}", assign),
            Node::Conditional(cond) => write!(f, "{}", cond),
        }
    }
}

fn add(names: &mut Vec<String>, leaf: &LeafContent) {
    if let Some(name) = leaf.variable_name() {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
}

/// `target = value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentNode {
    target: LeafContent,
    value: Box<Node>,
}

impl AssignmentNode {
    /// The target must be a plain name and the value must produce values:
    /// statements do not nest.
    pub fn new(target: impl Into<String>, value: Node) -> Result<Self, EvalError> {
        Self::from_leaf(LeafContent::variable(target), value)
    }

    pub fn from_leaf(target: LeafContent, value: Node) -> Result<Self, EvalError> {
        if !target.is_variable() {
            return Err(EvalError::Misuse {
                message: format!("cannot assign to '{}'", target),
            });
        }
        if matches!(value, Node::Assignment(_) | Node::Conditional(_)) {
            return Err(EvalError::Misuse {
                message: format!("'{}' cannot be used as a value", value),
            });
        }
        Ok(Self {
            target,
            value: Box::new(value),
        })
    }

    pub fn target(&self) -> &LeafContent {
        &self.target
    }

    pub fn target_name(&self) -> &str {
        // Construction only accepts variable targets.
        self.target.variable_name().unwrap_or_default()
    }

    pub fn value(&self) -> &Node {
        &self.value
    }
}

impl fmt::Display for AssignmentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.target, self.value)
    }
}

impl From<AssignmentNode> for Node {
    fn from(assign: AssignmentNode) -> Self {
        Node::Assignment(assign)
    }
}

/// `if (test) then A = x [else B = y]`.
///
/// At every point where `test` holds, the then-branch is written; at the
/// other points the else-branch is written, if there is one. Points a
/// branch does not select keep their previous values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalNode {
    test: LogicalArgs,
    then_branch: AssignmentNode,
    else_branch: Option<AssignmentNode>,
}

impl ConditionalNode {
    pub fn new(
        test: LogicalArgs,
        then_branch: AssignmentNode,
        else_branch: Option<AssignmentNode>,
    ) -> Self {
        Self {
            test,
            then_branch,
            else_branch,
        }
    }

    pub fn test(&self) -> &LogicalArgs {
        &self.test
    }

    pub fn then_branch(&self) -> &AssignmentNode {
        &self.then_branch
    }

    pub fn else_branch(&self) -> Option<&AssignmentNode> {
        self.else_branch.as_ref()
    }

    /// Field names read by the test and by both branches.
    pub fn inputs(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_inputs(&mut names);
        names
    }

    fn collect_inputs(&self, names: &mut Vec<String>) {
        self.test.operands().for_each(|leaf| add(names, leaf));
        self.then_branch.value().collect_inputs(names);
        if let Some(other) = &self.else_branch {
            other.value().collect_inputs(names);
        }
    }

    pub fn outputs(&self) -> Vec<String> {
        let mut names = vec![self.then_branch.target_name().to_string()];
        if let Some(other) = &self.else_branch {
            if other.target_name() != names[0] {
                names.push(other.target_name().to_string());
            }
        }
        names
    }
}

impl fmt::Display for ConditionalNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "if ({}) then {}", self.test, self.then_branch)?;
        if let Some(other) = &self.else_branch {
            write!(f, " else {}", other)?;
        }
        Ok(())
    }
}

impl From<ConditionalNode> for Node {
    fn from(cond: ConditionalNode) -> Self {
        Node::Conditional(cond)
    }
}
