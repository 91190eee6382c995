//! Whole-scope processing of statements.
//!
//! Every statement follows the same order: resolve and validate everything
//! it needs, compute its result into a buffer, and only then create or
//! write the target. A failure at any step before the write leaves the
//! scope exactly as it was.

use tracing::{debug, warn};

use crate::{
    evaluator::{EvalError, Evaluator, EvaluatorOptions, eval::check_pointwise},
    leaf::LeafContent,
    node::{AssignmentNode, ConditionalNode, Node, Processed, UnaryNode},
    scope::{self, MathData, Synched},
};

/// How an assignment's right-hand side is evaluated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Shape<'n> {
    /// `V = 3.2`
    Constant(f64),
    /// `V = missing`
    Missing,
    /// `V = W`
    Copy(&'n str),
    /// `V = keyword(...)` where the scope reports user data output.
    UserData(&'n UnaryNode),
    /// `V = keyword(...)` producing a field.
    UserField(&'n UnaryNode),
    /// Anything else: evaluated point by point.
    General,
}

pub(crate) fn shape_of<'n>(assign: &'n AssignmentNode, data: &dyn MathData) -> Shape<'n> {
    match assign.value() {
        Node::Leaf(LeafContent::Number { value, .. }) => Shape::Constant(*value),
        Node::Leaf(LeafContent::Missing) => Shape::Missing,
        Node::Leaf(LeafContent::Variable(name)) => Shape::Copy(name),
        Node::Unary(unary) => match unary.user_keyword() {
            Some(keyword) if data.produces_user_data(keyword) => Shape::UserData(unary),
            Some(_) => Shape::UserField(unary),
            None => Shape::General,
        },
        _ => Shape::General,
    }
}

pub(crate) fn process_assignment(
    assign: &AssignmentNode,
    data: &mut dyn MathData,
    options: EvaluatorOptions,
) -> Result<Processed, EvalError> {
    let target = assign.target_name();
    let shape = shape_of(assign, data);
    debug!(target = %target, ?shape, "processing assignment");

    let result = match shape {
        Shape::Constant(value) => {
            let out = output_field(data, target)?;
            out.set_all_to_value(value);
            Ok(Processed::Fields(vec![target.to_string()]))
        }
        Shape::Missing => {
            let out = output_field(data, target)?;
            out.set_all_missing();
            Ok(Processed::Fields(vec![target.to_string()]))
        }
        Shape::Copy(source) => copy_field(data, target, source),
        Shape::UserData(unary) => user_data(data, target, unary),
        Shape::UserField(unary) => user_field(data, target, unary),
        Shape::General => {
            check_output(data, target)?;
            let values = evaluate_all(assign.value(), data, options)?;
            write_field(data, target, &values)?;
            Ok(Processed::Fields(vec![target.to_string()]))
        }
    };

    if let Err(e) = &result {
        warn!(statement = %assign, error = %e, "assignment failed");
    }
    result
}

/// Evaluate a value-producing node at every point of the scope.
pub fn evaluate_all(
    node: &Node,
    data: &dyn MathData,
    options: EvaluatorOptions,
) -> Result<Vec<Option<f64>>, EvalError> {
    check_pointwise(node)?;
    let synched = synchronize(data, &node.inputs())?;
    let evaluator = Evaluator::new(options, data, &synched);
    (0..data.num_data())
        .map(|i| evaluator.value_at(node, i))
        .collect()
}

pub(crate) fn process_conditional(
    cond: &ConditionalNode,
    data: &mut dyn MathData,
    options: EvaluatorOptions,
) -> Result<Processed, EvalError> {
    let result = conditional(cond, data, options);
    if let Err(e) = &result {
        warn!(statement = %cond, error = %e, "conditional failed");
    }
    result
}

fn conditional(
    cond: &ConditionalNode,
    data: &mut dyn MathData,
    options: EvaluatorOptions,
) -> Result<Processed, EvalError> {
    let branches: Vec<&AssignmentNode> =
        core::iter::once(cond.then_branch()).chain(cond.else_branch()).collect();
    for branch in &branches {
        check_pointwise(branch.value())?;
        check_output(data, branch.target_name())?;
    }

    let synched = synchronize(data, &cond.inputs())?;

    // One buffer per distinct target, seeded with the target's current
    // contents so unselected points keep their values.
    let n = data.num_data();
    let mut buffers: Vec<(String, Vec<Option<f64>>)> = Vec::new();
    for branch in &branches {
        let name = branch.target_name();
        if buffers.iter().any(|(existing, _)| existing == name) {
            continue;
        }
        let seed = match data.data(name) {
            Some(field) => scope::snapshot(field),
            None => vec![None; n],
        };
        buffers.push((name.to_string(), seed));
    }

    {
        let evaluator = Evaluator::new(options, &*data, &synched);
        for i in 0..n {
            let branch = if cond.test().test_at(&*data, &synched, i) {
                Some(cond.then_branch())
            } else {
                cond.else_branch()
            };
            if let Some(branch) = branch {
                let value = evaluator.value_at(branch.value(), i)?;
                if let Some((_, buffer)) = buffers
                    .iter_mut()
                    .find(|(name, _)| name == branch.target_name())
                {
                    buffer[i] = value;
                }
            }
        }
    }

    for (name, values) in &buffers {
        write_field(data, name, values)?;
    }
    Ok(Processed::Fields(
        buffers.into_iter().map(|(name, _)| name).collect(),
    ))
}

/// `V = W`: copy with sentinel translation. Copying a field onto itself
/// changes nothing.
fn copy_field(
    data: &mut dyn MathData,
    target: &str,
    source: &str,
) -> Result<Processed, EvalError> {
    let synched = data.synchronize(&[source])?;
    if source != target {
        let values = match synched.get(source).and_then(|id| data.field(id)) {
            Some(field) => scope::snapshot(field),
            None => {
                return Err(EvalError::UnresolvedName {
                    name: source.to_string(),
                });
            }
        };
        check_output(data, target)?;
        write_field(data, target, &values)?;
    }
    Ok(Processed::Fields(vec![target.to_string()]))
}

/// Variable arguments of a user call must name either a field or stored
/// user data; which one the function expects is the host's business.
fn check_user_args(data: &dyn MathData, unary: &UnaryNode) -> Result<(), EvalError> {
    for name in &unary.inputs() {
        if data.field_id(name).is_none() && data.user_data(name).is_none() {
            debug!(name = %name, keyword = %unary.keyword(), "cannot synchronize user input");
            return Err(EvalError::UnresolvedName { name: name.clone() });
        }
    }
    Ok(())
}

fn user_data(
    data: &mut dyn MathData,
    target: &str,
    unary: &UnaryNode,
) -> Result<Processed, EvalError> {
    check_user_args(data, unary)?;
    let keyword = unary.keyword();
    let result = data.user_loop_function_to_user_data(keyword, unary.args())?;
    data.store_math_user_data(target, result)?;
    Ok(Processed::UserData(target.to_string()))
}

fn user_field(
    data: &mut dyn MathData,
    target: &str,
    unary: &UnaryNode,
) -> Result<Processed, EvalError> {
    check_user_args(data, unary)?;
    let mut scratch = match data.data(target) {
        Some(existing) => existing.clone_field(),
        None => data
            .example_data(target)
            .ok_or_else(|| EvalError::OutputUnavailable {
                name: target.to_string(),
            })?,
    };
    data.user_loop_function(unary.keyword(), unary.args(), scratch.as_mut())?;
    let values = scope::snapshot(scratch.as_ref());
    write_field(data, target, &values)?;
    Ok(Processed::Fields(vec![target.to_string()]))
}

/// Fail early if `name` neither exists nor can be created.
fn check_output(data: &dyn MathData, name: &str) -> Result<(), EvalError> {
    if data.field_id(name).is_some() || data.example_data(name).is_some() {
        Ok(())
    } else {
        Err(EvalError::OutputUnavailable {
            name: name.to_string(),
        })
    }
}

fn output_field<'d>(
    data: &'d mut dyn MathData,
    name: &str,
) -> Result<&'d mut dyn scope::MathLoopData, EvalError> {
    let id = data
        .ref_to_data(name, true)
        .ok_or_else(|| EvalError::OutputUnavailable {
            name: name.to_string(),
        })?;
    data.field_mut(id).ok_or_else(|| EvalError::OutputUnavailable {
        name: name.to_string(),
    })
}

/// Create or resolve `name` and write the whole buffer into it.
fn write_field(
    data: &mut dyn MathData,
    name: &str,
    values: &[Option<f64>],
) -> Result<(), EvalError> {
    if let Some(existing) = data.data(name) {
        if existing.num_data() != values.len() {
            return Err(EvalError::IndexOutOfRange {
                field: name.to_string(),
                index: values.len(),
                len: existing.num_data(),
            });
        }
    }
    let out = output_field(data, name)?;
    scope::commit(out, values)
}

fn synchronize(data: &dyn MathData, inputs: &[String]) -> Result<Synched, EvalError> {
    let names: Vec<&str> = inputs.iter().map(String::as_str).collect();
    data.synchronize(&names)
}
