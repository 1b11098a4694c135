//! Factories that turn declarative type descriptors into value trees.
//!
//! [`TypeRef`] is what a schema field or a list item type points at:
//!
//! - [`TypeRef::Scalar`]: a plain [`Scalar`] (the "no type given" case),
//! - [`TypeRef::List`]: the `[itemType]` marker, producing a [`List`],
//! - [`TypeRef::Type`]: any [`Type`], such as a [`ScalarType`] or a
//!   [`Schema`], which builds the value itself,
//! - [`TypeRef::Value`]: a pre-built value, reused as-is.

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::DataError;
use crate::value::{json_kind, List, Scalar, Value};

mod schema;
mod type_registry;

pub use schema::{Schema, SchemaBuilder, SchemaExtension, SchemaOptions};
pub use type_registry::TypeRegistry;

/// A value factory.
pub trait Type {
    fn name(&self) -> &str {
        "type"
    }

    /// Build a fresh value of this type. The base implementation is an
    /// abstract placeholder and always fails.
    fn create_value(&self) -> Result<Value, DataError> {
        Err(DataError::NotImplemented("create_value".to_string()))
    }
}

#[derive(Clone, Default)]
pub enum TypeRef {
    #[default]
    Scalar,
    List(Box<TypeRef>),
    Type(Rc<dyn Type>),
    Value(Value),
}

impl TypeRef {
    /// The `[item]` list marker.
    pub fn list(item: impl Into<TypeRef>) -> Self {
        TypeRef::List(Box::new(item.into()))
    }

    pub fn of(ty: impl Type + 'static) -> Self {
        TypeRef::Type(Rc::new(ty))
    }

    /// Build a value for this reference.
    ///
    /// `Value` references hand back the same shared value every time.
    pub fn create_value(&self) -> Result<Value, DataError> {
        match self {
            TypeRef::Scalar => Ok(Value::Scalar(Scalar::new())),
            TypeRef::List(item) => Ok(Value::List(List::new((**item).clone()))),
            TypeRef::Type(ty) => ty.create_value(),
            TypeRef::Value(value) => Ok(value.clone()),
        }
    }

    /// Compile a JSON descriptor.
    ///
    /// `null` is a plain scalar, a string names a type in `registry`, a
    /// one-element array is the list marker and an object is an inline
    /// schema.
    pub fn from_descriptor(desc: &JsonValue, registry: &TypeRegistry) -> Result<Self, DataError> {
        match desc {
            JsonValue::Null => Ok(TypeRef::Scalar),
            JsonValue::String(name) => registry
                .get(name)
                .map(TypeRef::Type)
                .ok_or_else(|| DataError::UnknownType(name.clone())),
            JsonValue::Array(items) if items.len() == 1 => {
                Ok(TypeRef::list(Self::from_descriptor(&items[0], registry)?))
            }
            JsonValue::Object(_) => Ok(Schema::from_json(desc, &JsonValue::Null, registry)?.into()),
            other => Err(DataError::type_kind(format!(
                "type must be a Type or a Value: got {}",
                descriptor_kind(other)
            ))),
        }
    }
}

fn descriptor_kind(desc: &JsonValue) -> String {
    match desc {
        JsonValue::Array(items) => format!("array of {} elements", items.len()),
        other => json_kind(other).to_string(),
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar => write!(f, "Scalar"),
            TypeRef::List(item) => write!(f, "[{:?}]", item),
            TypeRef::Type(ty) => write!(f, "Type({})", ty.name()),
            TypeRef::Value(value) => write!(f, "Value({})", value.kind()),
        }
    }
}

impl From<Value> for TypeRef {
    fn from(value: Value) -> Self {
        TypeRef::Value(value)
    }
}

impl From<Rc<dyn Type>> for TypeRef {
    fn from(ty: Rc<dyn Type>) -> Self {
        TypeRef::Type(ty)
    }
}

impl From<Schema> for TypeRef {
    fn from(schema: Schema) -> Self {
        TypeRef::of(schema)
    }
}

impl From<ScalarType> for TypeRef {
    fn from(ty: ScalarType) -> Self {
        TypeRef::of(ty)
    }
}

/// Build a value from an optional type reference; `None` gives a scalar.
pub fn create_value(type_ref: Option<&TypeRef>) -> Result<Value, DataError> {
    match type_ref {
        None => Ok(Value::Scalar(Scalar::new())),
        Some(type_ref) => type_ref.create_value(),
    }
}

/// Options for [`ScalarType`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScalarOptions {
    /// Stored in the slot when the scalar is created.
    pub initial_val: Option<JsonValue>,
    /// Read back whenever the slot holds `null`.
    pub default_val: Option<JsonValue>,
}

#[derive(Debug, Clone, Default)]
pub struct ScalarType {
    options: ScalarOptions,
}

impl ScalarType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ScalarOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScalarOptions {
        &self.options
    }
}

impl Type for ScalarType {
    fn name(&self) -> &str {
        "scalar"
    }

    fn create_value(&self) -> Result<Value, DataError> {
        Ok(Value::Scalar(Scalar::with_options(&self.options)))
    }
}
