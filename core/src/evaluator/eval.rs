//! Point evaluation of value-producing nodes.

use core::cell::Cell;

use crate::{
    evaluator::{EvalError, EvaluatorOptions, operators},
    node::{Node, UnaryKind, UnaryNode, UnaryOp},
    scope::{MathData, Synched},
};

/// Evaluator for one scope and one set of synchronized handles.
///
/// `value_at` returns `Ok(None)` for a missing result. Errors are reserved
/// for conditions that abort the whole statement.
pub struct Evaluator<'s> {
    options: EvaluatorOptions,
    data: &'s dyn MathData,
    synched: &'s Synched,
    depth: Cell<usize>,
}

impl<'s> Evaluator<'s> {
    pub fn new(options: EvaluatorOptions, data: &'s dyn MathData, synched: &'s Synched) -> Self {
        Self {
            options,
            data,
            synched,
            depth: Cell::new(0),
        }
    }

    /// Evaluate `node` at point `index`.
    pub fn value_at(&self, node: &Node, index: usize) -> Result<Option<f64>, EvalError> {
        let depth = self.depth.get();
        if depth >= self.options.max_depth {
            return Err(EvalError::StackOverflow {
                depth,
                max_depth: self.options.max_depth,
            });
        }

        self.depth.set(depth + 1);
        let result = self.value_at_inner(node, index);
        self.depth.set(depth);

        result
    }

    fn value_at_inner(&self, node: &Node, index: usize) -> Result<Option<f64>, EvalError> {
        match node {
            Node::Leaf(leaf) => Ok(leaf.value_at(self.data, self.synched, index)),

            Node::Binary(args) => Ok(args.value_at(self.data, self.synched, index)),

            // Logical chains are never missing: a missing operand makes its
            // term false.
            Node::Logical(args) => {
                let truth = args.test_at(self.data, self.synched, index);
                Ok(Some(if truth { 1.0 } else { 0.0 }))
            }

            Node::Unary(unary) => match unary.kind() {
                UnaryKind::Builtin(op) if op.is_window() => self.window_at(*op, unary, index),
                UnaryKind::Builtin(op) => self.pointwise_at(*op, unary, index),
                UnaryKind::User(keyword) => Err(EvalError::bad_arguments(
                    keyword.as_str(),
                    "user functions apply to a whole field and cannot be nested in an expression",
                )),
            },

            Node::Assignment(_) | Node::Conditional(_) => Err(EvalError::Misuse {
                message: format!("statement '{}' has no value", node),
            }),
        }
    }

    fn pointwise_at(
        &self,
        op: UnaryOp,
        unary: &UnaryNode,
        index: usize,
    ) -> Result<Option<f64>, EvalError> {
        let mut values = Vec::with_capacity(unary.args().len());
        for arg in unary.args() {
            match self.value_at(arg, index)? {
                Some(value) => values.push(value),
                None => return Ok(None),
            }
        }
        Ok(operators::apply_pointwise(op, &values))
    }

    /// Running statistic over a centered window of the named field.
    fn window_at(
        &self,
        op: UnaryOp,
        unary: &UnaryNode,
        index: usize,
    ) -> Result<Option<f64>, EvalError> {
        let (field_arg, width_arg) = match unary.args() {
            [field, width] => (field, width),
            args => {
                return Err(EvalError::bad_arguments(
                    op.keyword(),
                    format!("expected {}, got {} argument(s)", op.signature(), args.len()),
                ));
            }
        };
        let name = field_arg
            .leaf_name()
            .ok_or_else(|| EvalError::bad_arguments(op.keyword(), "first argument must name a field"))?;
        let width = width_arg.constant_value()? as usize;

        let field = match self.synched.get(name) {
            Some(id) => self.data.field(id),
            None => self.data.data(name),
        }
        .ok_or_else(|| EvalError::UnresolvedName {
            name: name.to_string(),
        })?;

        if field.get_val(index).is_none() {
            return Ok(None);
        }

        let half = width / 2;
        let start = index.saturating_sub(half);
        let end = (index + half + 1).min(field.num_data());
        let mut window: Vec<f64> = (start..end).filter_map(|i| field.get_val(i)).collect();
        Ok(operators::window_statistic(op, &mut window))
    }
}

/// Reject trees that cannot be evaluated point by point, before any point
/// is touched.
pub(crate) fn check_pointwise(node: &Node) -> Result<(), EvalError> {
    match node {
        Node::Leaf(_) | Node::Binary(_) | Node::Logical(_) => Ok(()),
        Node::Unary(unary) => match unary.kind() {
            UnaryKind::Builtin(op) => {
                op.check_args(unary.args())?;
                unary.args().iter().try_for_each(check_pointwise)
            }
            UnaryKind::User(keyword) => Err(EvalError::bad_arguments(
                keyword.as_str(),
                "user functions apply to a whole field and cannot be nested in an expression",
            )),
        },
        Node::Assignment(_) | Node::Conditional(_) => Err(EvalError::Misuse {
            message: format!("statement '{}' has no value", node),
        }),
    }
}
