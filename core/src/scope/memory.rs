//! In-memory scope backed by plain vectors.
//!
//! [`MemoryScope`] is the reference [`MathData`] implementation: fields are
//! `Vec<f64>` arrays with a per-field missing sentinel, and user functions
//! are closures registered in a [`UserFunctions`] table that many scopes can
//! share.

use std::sync::Arc;

use hashbrown::HashMap;
use tracing::{debug, trace};

use crate::evaluator::EvalError;
use crate::function_def::FunctionDef;
use crate::node::Node;
use crate::scope::{FieldId, MathData, MathLoopData};
use crate::special::{MathUserData, SpecialUserData};

/// Sentinel used when a field is built without an explicit one.
pub const DEFAULT_MISSING: f64 = -9999.0;

/// A named array of values.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayField {
    name: String,
    values: Vec<f64>,
    missing: f64,
}

impl ArrayField {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self::with_missing(name, values, DEFAULT_MISSING)
    }

    pub fn with_missing(name: impl Into<String>, values: Vec<f64>, missing: f64) -> Self {
        Self {
            name: name.into(),
            values,
            missing,
        }
    }

    /// Build from optional values; `None` becomes the sentinel.
    pub fn from_options(name: impl Into<String>, values: &[Option<f64>], missing: f64) -> Self {
        let values = values.iter().map(|v| v.unwrap_or(missing)).collect();
        Self::with_missing(name, values, missing)
    }

    /// Raw storage, sentinels included.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn to_options(&self) -> Vec<Option<f64>> {
        (0..self.values.len()).map(|i| self.get_val(i)).collect()
    }

    fn is_sentinel(&self, value: f64) -> bool {
        value == self.missing || (value.is_nan() && self.missing.is_nan())
    }

    fn check_index(&self, index: usize) -> Result<(), EvalError> {
        if index < self.values.len() {
            Ok(())
        } else {
            Err(EvalError::IndexOutOfRange {
                field: self.name.clone(),
                index,
                len: self.values.len(),
            })
        }
    }
}

impl MathLoopData for ArrayField {
    fn num_data(&self) -> usize {
        self.values.len()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn get_val(&self, index: usize) -> Option<f64> {
        let value = *self.values.get(index)?;
        (!self.is_sentinel(value)).then_some(value)
    }

    fn set_val(&mut self, index: usize, value: f64) -> Result<(), EvalError> {
        self.check_index(index)?;
        self.values[index] = value;
        Ok(())
    }

    fn set_missing(&mut self, index: usize) -> Result<(), EvalError> {
        self.check_index(index)?;
        self.values[index] = self.missing;
        Ok(())
    }

    fn missing_value(&self) -> f64 {
        self.missing
    }

    fn set_all_to_value(&mut self, value: f64) {
        self.values.iter_mut().for_each(|v| *v = value);
    }

    fn set_all_missing(&mut self) {
        let missing = self.missing;
        self.values.iter_mut().for_each(|v| *v = missing);
    }

    fn clone_field(&self) -> Box<dyn MathLoopData> {
        Box::new(self.clone())
    }
}

/// A user function that fills a field.
pub type FieldFunction =
    Box<dyn Fn(&dyn MathData, &[Node], &mut dyn MathLoopData) -> Result<(), EvalError> + Send + Sync>;

/// A user function that produces one result for the whole scope.
pub type UserDataFunction =
    Box<dyn Fn(&dyn MathData, &[Node]) -> Result<Box<dyn MathUserData>, EvalError> + Send + Sync>;

/// Registry of host-provided functions, keyed by keyword.
#[derive(Default)]
pub struct UserFunctions {
    defs: Vec<FunctionDef>,
    field_functions: HashMap<String, FieldFunction>,
    data_functions: HashMap<String, UserDataFunction>,
}

impl UserFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function that writes a field. Re-registering a keyword
    /// replaces the previous function.
    pub fn register_field<F>(&mut self, def: FunctionDef, function: F)
    where
        F: Fn(&dyn MathData, &[Node], &mut dyn MathLoopData) -> Result<(), EvalError>
            + Send
            + Sync
            + 'static,
    {
        let keyword = def.name().to_string();
        self.data_functions.remove(&keyword);
        self.field_functions.insert(keyword, Box::new(function));
        self.add_def(def);
    }

    /// Register a function whose result is stored as special user data.
    pub fn register_user_data<F>(&mut self, def: FunctionDef, function: F)
    where
        F: Fn(&dyn MathData, &[Node]) -> Result<Box<dyn MathUserData>, EvalError>
            + Send
            + Sync
            + 'static,
    {
        let keyword = def.name().to_string();
        self.field_functions.remove(&keyword);
        self.data_functions.insert(keyword, Box::new(function));
        self.add_def(def);
    }

    fn add_def(&mut self, def: FunctionDef) {
        self.defs.retain(|existing| existing.name() != def.name());
        self.defs.push(def);
        self.defs.sort();
    }

    pub fn defs(&self) -> &[FunctionDef] {
        &self.defs
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.field_functions.contains_key(keyword) || self.data_functions.contains_key(keyword)
    }
}

impl core::fmt::Debug for UserFunctions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserFunctions")
            .field("defs", &self.defs)
            .finish_non_exhaustive()
    }
}

/// A scope holding its fields in memory.
///
/// All fields have the same length; the first field added fixes it.
#[derive(Debug, Default)]
pub struct MemoryScope<'a> {
    fields: Vec<ArrayField>,
    by_name: HashMap<String, FieldId>,
    special: SpecialUserData<'a>,
    functions: Arc<UserFunctions>,
}

impl<'a> MemoryScope<'a> {
    /// An empty scope with owning special data and no user functions.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_functions(mut self, functions: Arc<UserFunctions>) -> Self {
        self.functions = functions;
        self
    }

    /// Replace the special data store, e.g. with a borrowing one that
    /// exposes a table owned by the caller.
    pub fn with_special(mut self, special: SpecialUserData<'a>) -> Self {
        self.special = special;
        self
    }

    /// Add an input field. Names must be unique and lengths must agree.
    pub fn add_field(&mut self, field: ArrayField) -> Result<FieldId, EvalError> {
        if self.by_name.contains_key(field.name()) {
            return Err(EvalError::Misuse {
                message: format!("field '{}' already exists", field.name()),
            });
        }
        if let Some(first) = self.fields.first() {
            if first.num_data() != field.num_data() {
                return Err(EvalError::Misuse {
                    message: format!(
                        "field '{}' has {} points, scope has {}",
                        field.name(),
                        field.num_data(),
                        first.num_data()
                    ),
                });
            }
        }
        Ok(self.install(field))
    }

    fn install(&mut self, field: ArrayField) -> FieldId {
        let id = FieldId(self.fields.len());
        trace!(name = %field.name(), id = id.0, "installing field");
        self.by_name.insert(field.name().to_string(), id);
        self.fields.push(field);
        id
    }

    /// The concrete field, for reading results back.
    pub fn array(&self, name: &str) -> Option<&ArrayField> {
        let id = self.by_name.get(name)?;
        self.fields.get(id.0)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name()).collect()
    }

    pub fn fields(&self) -> impl Iterator<Item = &ArrayField> {
        self.fields.iter()
    }

    pub fn special(&self) -> &SpecialUserData<'a> {
        &self.special
    }

    pub fn special_mut(&mut self) -> &mut SpecialUserData<'a> {
        &mut self.special
    }

    fn model(&self, name: &str) -> Option<ArrayField> {
        let first = self.fields.first()?;
        Some(ArrayField::with_missing(
            name,
            vec![first.missing; first.num_data()],
            first.missing,
        ))
    }
}

impl MathData for MemoryScope<'_> {
    fn num_data(&self) -> usize {
        self.fields.first().map_or(0, |f| f.num_data())
    }

    fn field_id(&self, name: &str) -> Option<FieldId> {
        self.by_name.get(name).copied()
    }

    fn field(&self, id: FieldId) -> Option<&dyn MathLoopData> {
        self.fields.get(id.0).map(|f| f as &dyn MathLoopData)
    }

    fn field_mut(&mut self, id: FieldId) -> Option<&mut dyn MathLoopData> {
        self.fields.get_mut(id.0).map(|f| f as &mut dyn MathLoopData)
    }

    fn example_data(&self, name: &str) -> Option<Box<dyn MathLoopData>> {
        self.model(name).map(|f| Box::new(f) as Box<dyn MathLoopData>)
    }

    fn create_field(&mut self, name: &str) -> Option<FieldId> {
        if let Some(id) = self.field_id(name) {
            return Some(id);
        }
        let field = self.model(name)?;
        debug!(name = %name, "creating output field");
        Some(self.install(field))
    }

    fn produces_user_data(&self, keyword: &str) -> bool {
        self.functions.data_functions.contains_key(keyword)
    }

    fn user_loop_function(
        &self,
        keyword: &str,
        args: &[Node],
        output: &mut dyn MathLoopData,
    ) -> Result<(), EvalError> {
        let function = self
            .functions
            .field_functions
            .get(keyword)
            .ok_or_else(|| EvalError::UnknownUserFunction {
                keyword: keyword.to_string(),
            })?;
        function(self as &dyn MathData, args, output)
    }

    fn user_loop_function_to_user_data(
        &self,
        keyword: &str,
        args: &[Node],
    ) -> Result<Box<dyn MathUserData>, EvalError> {
        let function = self
            .functions
            .data_functions
            .get(keyword)
            .ok_or_else(|| EvalError::UnknownUserFunction {
                keyword: keyword.to_string(),
            })?;
        function(self as &dyn MathData, args)
    }

    fn user_data(&self, name: &str) -> Option<&dyn MathUserData> {
        self.special.matching_data(name)
    }

    fn store_math_user_data(
        &mut self,
        name: &str,
        data: Box<dyn MathUserData>,
    ) -> Result<(), EvalError> {
        self.special.store(name, data)
    }

    fn user_functions(&self) -> &[FunctionDef] {
        self.functions.defs()
    }
}
