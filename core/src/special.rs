//! Side-channel results that are not per-point fields.
//!
//! Some user functions compute one object for a whole scope (a clump
//! table, a geometric lookup table, a kernel list) rather than a value per
//! point. Such results are stored by name in a [`SpecialUserData`] and
//! consumed later by other user functions.

use core::any::Any;
use core::fmt;

use hashbrown::HashMap;
use tracing::debug;

use crate::evaluator::EvalError;

/// Opaque per-scope result of a user function.
pub trait MathUserData: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// A scalar summary, for results that have one.
    fn as_float(&self) -> Option<f64> {
        None
    }
}

impl<'a> dyn MathUserData + 'a {
    pub fn downcast_ref<T: MathUserData>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: MathUserData>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// How a [`SpecialUserData`] holds its entries. Fixed at construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Ownership {
    /// Entries are boxed and dropped with the map.
    Owning,
    /// Entries are references to data owned elsewhere, such as a
    /// volume-level table shared by many sweep scopes.
    Borrowing,
}

enum Entry<'a> {
    Owned(Box<dyn MathUserData>),
    Borrowed(&'a dyn MathUserData),
}

impl fmt::Debug for Entry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Owned(data) => f.debug_tuple("Owned").field(data).finish(),
            Entry::Borrowed(data) => f.debug_tuple("Borrowed").field(data).finish(),
        }
    }
}

/// Map from name to special user data. Each name is bound at most once.
#[derive(Debug)]
pub struct SpecialUserData<'a> {
    ownership: Ownership,
    entries: HashMap<String, Entry<'a>>,
}

impl Default for SpecialUserData<'_> {
    fn default() -> Self {
        Self::owning()
    }
}

impl<'a> SpecialUserData<'a> {
    pub fn owning() -> Self {
        Self {
            ownership: Ownership::Owning,
            entries: HashMap::new(),
        }
    }

    pub fn borrowing() -> Self {
        Self {
            ownership: Ownership::Borrowing,
            entries: HashMap::new(),
        }
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub fn is_owning(&self) -> bool {
        self.ownership == Ownership::Owning
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names currently bound, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Take ownership of `data` under `name`. Refused for a duplicate name
    /// or when this map is in borrowing mode.
    pub fn store(&mut self, name: &str, data: Box<dyn MathUserData>) -> Result<(), EvalError> {
        if self.ownership != Ownership::Owning {
            return Err(EvalError::Misuse {
                message: format!("cannot store owned data '{}' in a borrowing map", name),
            });
        }
        self.bind(name, Entry::Owned(data))
    }

    /// Reference `data` under `name`. Refused for a duplicate name or when
    /// this map is in owning mode.
    pub fn store_borrowed(
        &mut self,
        name: &str,
        data: &'a dyn MathUserData,
    ) -> Result<(), EvalError> {
        if self.ownership != Ownership::Borrowing {
            return Err(EvalError::Misuse {
                message: format!("cannot store borrowed data '{}' in an owning map", name),
            });
        }
        self.bind(name, Entry::Borrowed(data))
    }

    fn bind(&mut self, name: &str, entry: Entry<'a>) -> Result<(), EvalError> {
        if self.entries.contains_key(name) {
            debug!(name = %name, "user data already bound");
            return Err(EvalError::DuplicateUserData {
                name: name.to_string(),
            });
        }
        self.entries.insert(name.to_string(), entry);
        Ok(())
    }

    pub fn matching_data(&self, name: &str) -> Option<&dyn MathUserData> {
        match self.entries.get(name)? {
            Entry::Owned(data) => Some(data.as_ref()),
            Entry::Borrowed(data) => Some(*data),
        }
    }

    /// Mutable access; only owned entries can be modified.
    pub fn matching_data_mut(&mut self, name: &str) -> Option<&mut dyn MathUserData> {
        match self.entries.get_mut(name)? {
            Entry::Owned(data) => Some(data.as_mut()),
            Entry::Borrowed(_) => None,
        }
    }

    /// Typed lookup.
    pub fn get<T: MathUserData>(&self, name: &str) -> Option<&T> {
        self.matching_data(name)?.downcast_ref::<T>()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
