use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::{ScalarType, Type};

/// Named types available to JSON descriptors.
///
/// A fresh registry knows `"scalar"`. Schemas can be registered under a
/// name so that later descriptors refer to them by string.
#[derive(Clone)]
pub struct TypeRegistry {
    types: IndexMap<String, Rc<dyn Type>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("scalar", ScalarType::new());
        registry
    }

    pub fn empty() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Register or replace a named type, returning the previous one.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        ty: impl Type + 'static,
    ) -> Option<Rc<dyn Type>> {
        self.register_rc(name, Rc::new(ty))
    }

    pub fn register_rc(&mut self, name: impl Into<String>, ty: Rc<dyn Type>) -> Option<Rc<dyn Type>> {
        self.types.insert(name.into(), ty)
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn Type>> {
        self.types.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.types.keys()).finish()
    }
}
