use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value as JsonValue;

use super::{impl_observable, Reactive, Value, ValueCore};
use crate::error::DataError;
use crate::types::ScalarOptions;

/// A leaf value holding one opaque JSON value.
#[derive(Clone)]
pub struct Scalar {
    inner: Rc<ScalarInner>,
}

struct ScalarInner {
    core: ValueCore,
    slot: RefCell<JsonValue>,
    /// Reported by `get_val` while the slot holds `null`.
    default_val: Option<JsonValue>,
}

impl Scalar {
    /// A scalar holding `null`.
    pub fn new() -> Self {
        Self::with_options(&ScalarOptions::default())
    }

    pub fn with_options(options: &ScalarOptions) -> Self {
        Self {
            inner: Rc::new(ScalarInner {
                core: ValueCore::new(),
                slot: RefCell::new(options.initial_val.clone().unwrap_or(JsonValue::Null)),
                default_val: options.default_val.clone(),
            }),
        }
    }

    pub fn ptr_eq(&self, other: &Scalar) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Scalar {
    fn default() -> Self {
        Self::new()
    }
}

impl Reactive for Scalar {
    fn core(&self) -> &ValueCore {
        &self.inner.core
    }

    fn to_value(&self) -> Value {
        Value::Scalar(self.clone())
    }

    fn get_val(&self) -> JsonValue {
        let slot = self.inner.slot.borrow();
        match (&*slot, &self.inner.default_val) {
            (JsonValue::Null, Some(default_val)) => default_val.clone(),
            (val, _) => val.clone(),
        }
    }

    fn set_val(&self, val: JsonValue) -> Result<JsonValue, DataError> {
        self.inner.slot.replace(val);
        Ok(self.get_val())
    }
}

impl_observable!(Scalar);

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scalar")
            .field("value", &self.get_val())
            .field("core", &self.inner.core)
            .finish()
    }
}
