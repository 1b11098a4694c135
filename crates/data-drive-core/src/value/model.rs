use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use data_drive_path::validate_path;
use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

use super::{impl_observable, json_kind, List, Reactive, Scalar, Value, ValueCore};
use crate::error::DataError;
use crate::notification::Change;
use crate::types::{Schema, TypeRef};

/// What [`Model::get_property`] hands back: lists come back as the live
/// [`List`] so callers can use its operations, everything else unwrapped.
#[derive(Debug, Clone)]
pub enum Property {
    List(List),
    Json(JsonValue),
}

impl Property {
    pub fn as_list(&self) -> Option<&List> {
        match self {
            Property::List(list) => Some(list),
            Property::Json(_) => None,
        }
    }

    /// The plain value, reading lists through.
    pub fn into_json(self) -> JsonValue {
        match self {
            Property::List(list) => list.value(),
            Property::Json(val) => val,
        }
    }
}

/// A keyed value of named children.
///
/// Properties keep their declaration order, which is also the key order of
/// [`Reactive::get_val`] snapshots.
#[derive(Clone)]
pub struct Model {
    inner: Rc<ModelInner>,
}

struct ModelInner {
    core: ValueCore,
    properties: RefCell<IndexMap<String, Value>>,
    schema: Option<Schema>,
}

impl Model {
    /// A model with no schema and no properties. Properties can be added
    /// with [`Model::define`].
    pub fn new() -> Self {
        Self::with_schema(None)
    }

    fn with_schema(schema: Option<Schema>) -> Self {
        Self {
            inner: Rc::new(ModelInner {
                core: ValueCore::new(),
                properties: RefCell::new(IndexMap::new()),
                schema,
            }),
        }
    }

    /// Build a model with one property per descriptor entry, in order.
    pub(crate) fn from_schema(schema: &Schema) -> Result<Self, DataError> {
        let model = Self::with_schema(Some(schema.clone()));
        for (name, type_ref) in schema.descriptor() {
            model.define(name.clone(), type_ref)?;
        }
        Ok(model)
    }

    pub fn ptr_eq(&self, other: &Model) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.inner.schema.as_ref()
    }

    /// Create the child for `name` from `type_ref` and install it.
    pub fn define(&self, name: impl Into<String>, type_ref: &TypeRef) -> Result<(), DataError> {
        let name = name.into();
        validate_path(&[name.as_str()])?;
        if self.inner.properties.borrow().contains_key(&name) {
            return Err(DataError::DuplicateProperty(name));
        }
        let child = type_ref.create_value()?;
        self.inner.properties.borrow_mut().insert(name, child);
        Ok(())
    }

    /// Swap the child behind an existing name, keeping its position.
    pub(crate) fn replace_property(&self, name: &str, child: Value) -> Option<Value> {
        let mut properties = self.inner.properties.borrow_mut();
        let slot = properties.get_mut(name)?;
        Some(std::mem::replace(slot, child))
    }

    /// Look up a child by its declared (not mapped) name.
    pub fn find_property(&self, name: &str) -> Option<Value> {
        self.inner.properties.borrow().get(name).cloned()
    }

    pub fn property_names(&self) -> Vec<String> {
        self.inner.properties.borrow().keys().cloned().collect()
    }

    pub fn get_property(&self, name: &str) -> Option<Property> {
        self.find_property(name).map(|child| match child {
            Value::List(list) => Property::List(list),
            other => Property::Json(other.value()),
        })
    }

    /// The unwrapped value of a property, lists included.
    pub fn get(&self, name: &str) -> Option<JsonValue> {
        self.find_property(name).map(|child| child.value())
    }

    pub fn list(&self, name: &str) -> Option<List> {
        match self.find_property(name)? {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn model(&self, name: &str) -> Option<Model> {
        match self.find_property(name)? {
            Value::Model(model) => Some(model),
            _ => None,
        }
    }

    pub fn scalar(&self, name: &str) -> Option<Scalar> {
        match self.find_property(name)? {
            Value::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Assign one property. The child emits its own `update`; the model
    /// then emits a `property` notification with the stored value.
    pub fn set_property(&self, name: &str, value: JsonValue) -> Result<JsonValue, DataError> {
        let child = self
            .find_property(name)
            .ok_or_else(|| DataError::UnknownProperty(name.to_string()))?;
        let stored = match child.set_value(value) {
            Ok(stored) => stored,
            Err(err) => {
                // The child may have been partly written.
                self.flush(None);
                return Err(err);
            }
        };
        self.flush(Some(Change::Property {
            name: name.to_string(),
            value: stored.clone(),
        }));
        Ok(stored)
    }

    /// External key for a declared name.
    pub fn map_name<'a>(&'a self, name: &'a str) -> &'a str {
        match &self.inner.schema {
            Some(schema) => schema.map_name(name),
            None => name,
        }
    }

    fn entries(&self) -> Vec<(String, Value)> {
        self.inner
            .properties
            .borrow()
            .iter()
            .map(|(name, child)| (name.clone(), child.clone()))
            .collect()
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Reactive for Model {
    fn core(&self) -> &ValueCore {
        &self.inner.core
    }

    fn to_value(&self) -> Value {
        Value::Model(self.clone())
    }

    fn get_val(&self) -> JsonValue {
        let mut out = Map::new();
        for (name, child) in self.entries() {
            out.insert(self.map_name(&name).to_string(), child.value());
        }
        JsonValue::Object(out)
    }

    /// Reads each property from its external key. `null` resets every
    /// property from `null`.
    fn set_val(&self, data: JsonValue) -> Result<JsonValue, DataError> {
        let data = match data {
            JsonValue::Object(map) => Some(map),
            JsonValue::Null => None,
            other => {
                return Err(DataError::type_kind(format!(
                    "model data is not an object: got {}",
                    json_kind(&other)
                )))
            }
        };
        let mut out = Map::new();
        for (name, child) in self.entries() {
            let key = self.map_name(&name).to_string();
            let incoming = data
                .as_ref()
                .and_then(|map| map.get(&key))
                .cloned()
                .unwrap_or(JsonValue::Null);
            let stored = child.set_value(incoming)?;
            out.insert(key, stored);
        }
        Ok(JsonValue::Object(out))
    }

    fn find_property(&self, name: &str) -> Option<Value> {
        Model::find_property(self, name)
    }
}

impl_observable!(Model);

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("properties", &self.property_names())
            .field("core", &self.inner.core)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn define_rejects_duplicates() {
        let m = Model::new();
        m.define("a", &TypeRef::Scalar).unwrap();
        assert_eq!(
            m.define("a", &TypeRef::Scalar),
            Err(DataError::DuplicateProperty("a".to_string()))
        );
    }

    #[test]
    fn define_rejects_dotted_names() {
        let m = Model::new();
        assert!(matches!(
            m.define("a.b", &TypeRef::Scalar),
            Err(DataError::InvalidName(_))
        ));
        assert!(m.property_names().is_empty());
    }

    #[test]
    fn set_unknown_property_fails() {
        let m = Model::new();
        assert!(matches!(
            m.set_property("nope", json!(1)),
            Err(DataError::UnknownProperty(_))
        ));
    }

    #[test]
    fn set_val_rejects_scalars() {
        let m = Model::new();
        m.define("a", &TypeRef::Scalar).unwrap();
        assert!(matches!(m.set_value(json!(3)), Err(DataError::TypeKind(_))));
    }

    #[test]
    fn failed_set_value_still_flushes_applied_part() {
        let m = Model::new();
        m.define("a", &TypeRef::Scalar).unwrap();
        m.define("b", &TypeRef::list(TypeRef::Scalar)).unwrap();
        m.set_caching(true);
        assert_eq!(m.value(), json!({"a": null, "b": []}));
        let rev = m.revision();

        let err = m.set_value(json!({"a": 1, "b": 5})).unwrap_err();

        assert!(matches!(err, DataError::TypeKind(_)));
        assert_eq!(m.revision(), rev + 1);
        assert_eq!(m.value(), json!({"a": 1, "b": []}));
        assert_eq!(m.value(), m.get_val());
    }

    #[test]
    fn failed_set_property_moves_revision() {
        let inner = Schema::builder().scalar("x").list("ys", TypeRef::Scalar).build();
        let m = Model::new();
        m.define("inner", &TypeRef::from(inner)).unwrap();
        m.set_caching(true);
        assert_eq!(m.value(), json!({"inner": {"x": null, "ys": []}}));

        assert!(m.set_property("inner", json!({"x": 1, "ys": 2})).is_err());

        assert_eq!(m.value(), json!({"inner": {"x": 1, "ys": []}}));
    }

    #[test]
    fn set_null_resets_properties() {
        let m = Model::new();
        m.define("a", &TypeRef::Scalar).unwrap();
        m.define("b", &TypeRef::list(TypeRef::Scalar)).unwrap();
        m.set_value(json!({"a": 1, "b": [1]})).unwrap();
        m.set_value(JsonValue::Null).unwrap();
        assert_eq!(m.value(), json!({"a": null, "b": []}));
    }
}
