use std::ops::Deref;

use tracing::debug;

use crate::error::DataError;
use crate::types::TypeRef;
use crate::value::{Model, Value};

/// A named collection of top-level values.
///
/// The registry is itself a [`Model`] without a schema, so entries can be
/// reached with `query`. There is no process-wide instance: the application
/// creates one and hands it to whatever needs it.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    model: Model,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `name` from `type_ref`, or replace the existing entry.
    ///
    /// Returns the replaced value. Its listeners stay attached to it; moving
    /// them over is up to the caller.
    pub fn register(&self, name: &str, type_ref: &TypeRef) -> Result<Option<Value>, DataError> {
        if self.model.find_property(name).is_none() {
            self.model.define(name, type_ref)?;
            debug!(name, "registered model");
            return Ok(None);
        }
        let next = type_ref.create_value()?;
        let prev = self.model.replace_property(name, next);
        debug!(name, "replaced registered model");
        Ok(prev)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.model.find_property(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.model.property_names()
    }

    pub fn as_model(&self) -> &Model {
        &self.model
    }
}

impl Deref for ModelRegistry {
    type Target = Model;

    fn deref(&self) -> &Model {
        &self.model
    }
}
