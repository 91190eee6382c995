//! The data model an expression is evaluated against.
//!
//! A scope ([`MathData`]) is one unit of evaluation context: a ray, a sweep,
//! or a volume. It owns a set of named fields ([`MathLoopData`]), each an
//! indexable array of values with its own missing sentinel.
//!
//! Nodes never hold on to fields. Before a per-point loop starts, every name
//! an expression needs is resolved once into a [`FieldId`] handle and cached
//! in a [`Synched`] table; the loop then reads through those handles. This
//! puts every "field does not exist" failure before the first point is
//! touched.

pub mod memory;


use core::fmt;

use hashbrown::HashMap;
use tracing::debug;

use crate::evaluator::EvalError;
use crate::function_def::FunctionDef;
use crate::node::Node;
use crate::special::MathUserData;

/// Stable handle to a field within one scope instance.
///
/// A handle stays valid for the lifetime of the scope; adding fields never
/// invalidates existing handles.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub usize);

/// One named, indexable field of data.
pub trait MathLoopData: fmt::Debug {
    /// Number of points. Constant for the lifetime of a scope instance.
    fn num_data(&self) -> usize;

    fn name(&self) -> &str;

    fn name_match(&self, name: &str) -> bool {
        self.name() == name
    }

    /// Value at `index`, or `None` if the index is out of range or the
    /// stored value is the missing sentinel.
    fn get_val(&self, index: usize) -> Option<f64>;

    fn set_val(&mut self, index: usize, value: f64) -> Result<(), EvalError>;

    fn set_missing(&mut self, index: usize) -> Result<(), EvalError>;

    /// The sentinel that marks a point as missing.
    fn missing_value(&self) -> f64;

    fn set_all_to_value(&mut self, value: f64);

    fn set_all_missing(&mut self) {
        for i in 0..self.num_data() {
            // Indices are in range by construction.
            let _ = self.set_missing(i);
        }
    }

    /// Deep copy with independent storage.
    fn clone_field(&self) -> Box<dyn MathLoopData>;

    /// Debug print of name and contents.
    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "{} [", self.name())?;
        for i in 0..self.num_data() {
            if i > 0 {
                write!(out, ", ")?;
            }
            match self.get_val(i) {
                Some(v) => write!(out, "{}", v)?,
                None => write!(out, "missing")?,
            }
        }
        writeln!(out, "]")
    }
}

/// One evaluation scope: a named collection of fields plus the hooks that
/// user-defined functions are dispatched through.
///
/// Implementations must keep field names unique and must keep every
/// [`FieldId`] they hand out valid for their own lifetime.
pub trait MathData {
    /// Number of points in each field of this scope.
    fn num_data(&self) -> usize;

    /// Resolve an existing field by name.
    fn field_id(&self, name: &str) -> Option<FieldId>;

    fn field(&self, id: FieldId) -> Option<&dyn MathLoopData>;

    fn field_mut(&mut self, id: FieldId) -> Option<&mut dyn MathLoopData>;

    /// A detached, all-missing field named `name` that is compatible with
    /// this scope's storage. `None` if the scope has nothing to model a new
    /// field on.
    fn example_data(&self, name: &str) -> Option<Box<dyn MathLoopData>>;

    /// Create and install a new field named `name`, modeled on
    /// [`example_data`](Self::example_data). Returns the existing handle if
    /// the field is already present.
    fn create_field(&mut self, name: &str) -> Option<FieldId>;

    /// Shared lookup by name.
    fn data(&self, name: &str) -> Option<&dyn MathLoopData> {
        self.field(self.field_id(name)?)
    }

    /// Mutable lookup by name, optionally creating the field.
    fn ref_to_data(&mut self, name: &str, allow_create: bool) -> Option<FieldId> {
        match self.field_id(name) {
            Some(id) => Some(id),
            None if allow_create => self.create_field(name),
            None => None,
        }
    }

    /// Resolve every input name to a handle before a per-point loop.
    ///
    /// Every unresolved name is reported through `tracing` and the first one
    /// is returned as the error.
    fn synchronize(&self, inputs: &[&str]) -> Result<Synched, EvalError> {
        let mut synched = Synched::default();
        let mut first_missing = None;
        for name in inputs {
            match self.field_id(name) {
                Some(id) => synched.insert(name, id),
                None => {
                    debug!(name = %name, "cannot synchronize input");
                    first_missing.get_or_insert_with(|| name.to_string());
                }
            }
        }
        match first_missing {
            Some(name) => Err(EvalError::UnresolvedName { name }),
            None => Ok(synched),
        }
    }

    /// Whether user function `keyword` produces a [`MathUserData`] rather
    /// than a field.
    fn produces_user_data(&self, _keyword: &str) -> bool {
        false
    }

    /// Run user function `keyword` over the whole scope, writing into
    /// `output`. `output` is a scratch field; the engine commits it to the
    /// target only if this returns `Ok`.
    fn user_loop_function(
        &self,
        keyword: &str,
        _args: &[Node],
        _output: &mut dyn MathLoopData,
    ) -> Result<(), EvalError> {
        Err(EvalError::UnknownUserFunction {
            keyword: keyword.to_string(),
        })
    }

    /// Run user function `keyword`, producing one opaque result for the
    /// whole scope.
    fn user_loop_function_to_user_data(
        &self,
        keyword: &str,
        _args: &[Node],
    ) -> Result<Box<dyn MathUserData>, EvalError> {
        Err(EvalError::UnknownUserFunction {
            keyword: keyword.to_string(),
        })
    }

    /// Look up special (non-per-point) data by name.
    fn user_data(&self, _name: &str) -> Option<&dyn MathUserData> {
        None
    }

    /// Store special data under `name`. A name can be bound only once.
    fn store_math_user_data(
        &mut self,
        name: &str,
        _data: Box<dyn MathUserData>,
    ) -> Result<(), EvalError> {
        Err(EvalError::Misuse {
            message: format!("scope cannot store user data '{}'", name),
        })
    }

    /// Descriptions of the user functions this scope understands.
    fn user_functions(&self) -> &[FunctionDef] {
        &[]
    }
}

/// Handles resolved by [`MathData::synchronize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Synched {
    ids: HashMap<String, FieldId>,
}

impl Synched {
    pub fn insert(&mut self, name: &str, id: FieldId) {
        self.ids.insert(name.to_string(), id);
    }

    pub fn get(&self, name: &str) -> Option<FieldId> {
        self.ids.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Write a computed buffer into `out`; `None` entries become missing.
pub(crate) fn commit(out: &mut dyn MathLoopData, values: &[Option<f64>]) -> Result<(), EvalError> {
    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) => out.set_val(i, *v)?,
            None => out.set_missing(i)?,
        }
    }
    Ok(())
}

/// Snapshot of a field as a buffer, for commit-later updates.
pub(crate) fn snapshot(field: &dyn MathLoopData) -> Vec<Option<f64>> {
    (0..field.num_data()).map(|i| field.get_val(i)).collect()
}
