//! Terminal values of the expression tree.
//!
//! A [`LeafContent`] is the smallest unit an expression can mention: a
//! field name, a literal number, or the `missing` keyword.

use core::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::evaluator::EvalError;
use crate::scope::{MathData, Synched};

/// Immutable terminal value.
///
/// Exactly one variant is active. `Missing` has no numeric payload and is
/// never read as a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LeafContent {
    /// A reference to a named field of the scope.
    Variable(String),

    /// A literal number. `label` keeps the text the number was written as.
    Number { label: String, value: f64 },

    /// The `missing` keyword.
    Missing,
}

impl LeafContent {
    pub fn variable(name: impl Into<String>) -> Self {
        LeafContent::Variable(name.into())
    }

    /// A number whose label is its default textual form.
    pub fn number(value: f64) -> Self {
        LeafContent::Number {
            label: format!("{}", value),
            value,
        }
    }

    pub fn labeled_number(label: impl Into<String>, value: f64) -> Self {
        LeafContent::Number {
            label: label.into(),
            value,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, LeafContent::Variable(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, LeafContent::Number { .. })
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, LeafContent::Missing)
    }

    /// Name of the referenced field, for variable leaves only.
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            LeafContent::Variable(name) => Some(name),
            _ => None,
        }
    }

    /// Value at one point of a scope.
    ///
    /// Numbers always produce their constant. `Missing` never produces a
    /// value. Variables produce the stored value unless the field is absent
    /// or holds the scope's missing sentinel at `index`.
    pub fn value_at(&self, data: &dyn MathData, synched: &Synched, index: usize) -> Option<f64> {
        match self {
            LeafContent::Number { value, .. } => Some(*value),
            LeafContent::Missing => None,
            LeafContent::Variable(name) => {
                let field = match synched.get(name) {
                    Some(id) => data.field(id),
                    None => data.data(name),
                }?;
                field.get_val(index)
            }
        }
    }

    /// Context-free value; only numbers have one.
    pub fn constant_value(&self) -> Result<f64, EvalError> {
        match self {
            LeafContent::Number { value, .. } => Ok(*value),
            LeafContent::Variable(name) => {
                warn!(name = %name, "constant value requested from a variable");
                Err(EvalError::Misuse {
                    message: format!("'{}' is a variable, not a constant", name),
                })
            }
            LeafContent::Missing => {
                warn!("constant value requested from 'missing'");
                Err(EvalError::Misuse {
                    message: "'missing' has no numeric value".to_string(),
                })
            }
        }
    }
}

impl fmt::Display for LeafContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafContent::Variable(name) => write!(f, "{}", name),
            LeafContent::Number { label, .. } => write!(f, "{}", label),
            LeafContent::Missing => write!(f, "missing"),
        }
    }
}
