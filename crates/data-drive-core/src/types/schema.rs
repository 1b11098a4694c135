use std::fmt;
use std::rc::Rc;

use data_drive_path::validate_path;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::{Type, TypeRef, TypeRegistry};
use crate::error::DataError;
use crate::value::{json_kind, Model, Value};

/// Options attached to a [`Schema`].
///
/// `mappings` translates declared property names to the external keys used
/// when a model is read or written as a whole. Any other keys are kept in
/// `extra` for extensions to pick up.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchemaOptions {
    pub mappings: IndexMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl SchemaOptions {
    pub fn with_mapping(mut self, internal: impl Into<String>, external: impl Into<String>) -> Self {
        self.mappings.insert(internal.into(), external.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.extra.get(key)
    }
}

/// Hooks run around schema and model construction.
pub trait SchemaExtension {
    /// Called once when the schema is built.
    fn configure(&self, _options: &SchemaOptions) {}

    /// Called after each model built from the schema is fully defined.
    fn model_created(&self, _model: &Model, _schema: &Schema) {}
}

/// An immutable model descriptor.
///
/// Cloning shares the descriptor. Every [`Type::create_value`] call builds a
/// fresh [`Model`] whose properties follow the descriptor's order.
#[derive(Clone)]
pub struct Schema {
    inner: Rc<SchemaInner>,
}

struct SchemaInner {
    descriptor: IndexMap<String, TypeRef>,
    options: SchemaOptions,
    extensions: Vec<Rc<dyn SchemaExtension>>,
}

impl Schema {
    pub fn new<K: Into<String>>(
        descriptor: impl IntoIterator<Item = (K, TypeRef)>,
        options: SchemaOptions,
    ) -> Self {
        Self::with_extensions(descriptor, options, Vec::new())
    }

    pub fn with_extensions<K: Into<String>>(
        descriptor: impl IntoIterator<Item = (K, TypeRef)>,
        options: SchemaOptions,
        extensions: Vec<Rc<dyn SchemaExtension>>,
    ) -> Self {
        let descriptor: IndexMap<String, TypeRef> = descriptor
            .into_iter()
            .map(|(name, type_ref)| (name.into(), type_ref))
            .collect();
        for ext in &extensions {
            ext.configure(&options);
        }
        Self {
            inner: Rc::new(SchemaInner {
                descriptor,
                options,
                extensions,
            }),
        }
    }

    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Build a schema from a JSON descriptor object and JSON options.
    ///
    /// Field descriptors are compiled with [`TypeRef::from_descriptor`].
    /// Field names must be single path segments. `options` may be `null`.
    pub fn from_json(
        descriptor: &JsonValue,
        options: &JsonValue,
        registry: &TypeRegistry,
    ) -> Result<Self, DataError> {
        let JsonValue::Object(fields) = descriptor else {
            return Err(DataError::type_kind(format!(
                "schema descriptor is not an object: got {}",
                json_kind(descriptor)
            )));
        };
        let options = match options {
            JsonValue::Null => SchemaOptions::default(),
            other => SchemaOptions::deserialize(other)
                .map_err(|e| DataError::type_kind(format!("invalid schema options: {e}")))?,
        };
        let mut compiled = Vec::with_capacity(fields.len());
        for (name, desc) in fields {
            validate_path(&[name.as_str()])?;
            compiled.push((name.clone(), TypeRef::from_descriptor(desc, registry)?));
        }
        Ok(Self::new(compiled, options))
    }

    pub fn descriptor(&self) -> &IndexMap<String, TypeRef> {
        &self.inner.descriptor
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.inner.options
    }

    /// The external key for `name`; unmapped names pass through.
    pub fn map_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.inner
            .options
            .mappings
            .get(name)
            .map_or(name, String::as_str)
    }

    pub fn ptr_eq(&self, other: &Schema) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Typed shortcut for [`Type::create_value`].
    pub fn create_model(&self) -> Result<Model, DataError> {
        let model = Model::from_schema(self)?;
        for ext in &self.inner.extensions {
            ext.model_created(&model, self);
        }
        debug!(
            properties = self.inner.descriptor.len(),
            extensions = self.inner.extensions.len(),
            "model created"
        );
        Ok(model)
    }
}

impl Type for Schema {
    fn name(&self) -> &str {
        "schema"
    }

    fn create_value(&self) -> Result<Value, DataError> {
        self.create_model().map(Value::Model)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("descriptor", &self.inner.descriptor)
            .field("options", &self.inner.options)
            .field("extensions", &self.inner.extensions.len())
            .finish()
    }
}

/// Incremental [`Schema`] construction.
#[derive(Default)]
pub struct SchemaBuilder {
    fields: Vec<(String, TypeRef)>,
    options: SchemaOptions,
    extensions: Vec<Rc<dyn SchemaExtension>>,
}

impl SchemaBuilder {
    pub fn field(mut self, name: impl Into<String>, type_ref: impl Into<TypeRef>) -> Self {
        self.fields.push((name.into(), type_ref.into()));
        self
    }

    pub fn scalar(self, name: impl Into<String>) -> Self {
        self.field(name, TypeRef::Scalar)
    }

    pub fn list(self, name: impl Into<String>, item: impl Into<TypeRef>) -> Self {
        self.field(name, TypeRef::list(item))
    }

    pub fn mapping(mut self, internal: impl Into<String>, external: impl Into<String>) -> Self {
        self.options = self.options.with_mapping(internal, external);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.options.extra.insert(key.into(), value);
        self
    }

    pub fn extension(mut self, ext: Rc<dyn SchemaExtension>) -> Self {
        self.extensions.push(ext);
        self
    }

    pub fn build(self) -> Schema {
        Schema::with_extensions(self.fields, self.options, self.extensions)
    }
}
