//! Reactive values.
//!
//! A value tree is made of three kinds of node, all cheap `Rc` handles:
//!
//! - [`Scalar`]: a leaf holding one opaque JSON value,
//! - [`List`]: a sparse, ordered sequence of child values of one item type,
//! - [`Model`]: a fixed, ordered set of named child values built from a
//!   [`Schema`](crate::types::Schema).
//!
//! [`Value`] is the tagged union over the three, and [`Reactive`] is the
//! behaviour they share: reading and writing the whole value, revision
//! tracking with an optional cached snapshot, change notification and path
//! queries.
//!
//! Notifications never bubble. A parent that wants to hear about a child
//! has to subscribe to the child itself.

use std::cell::{Cell, RefCell};
use std::fmt;

use data_drive_path::{format_path, parse_path};
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::error::DataError;
use crate::notification::{Change, Notification};
use crate::notifier::{Notifier, Observable};

/// Implements [`Observable`] for a concrete value handle.
macro_rules! impl_observable {
    ($ty:ty) => {
        impl $crate::notifier::Observable<$crate::notification::Notification> for $ty {
            fn notifier(
                &self,
            ) -> &$crate::notifier::Notifier<$crate::notification::Notification> {
                &$crate::value::Reactive::core(self).notifier
            }
        }
    };
}
pub(crate) use impl_observable;

mod list;
mod model;
mod scalar;

pub use list::{Items, List, Slot, MAX_GROWTH};
pub use model::{Model, Property};
pub use scalar::Scalar;

/// State shared by every value kind: the notifier, the revision counter and
/// the cached snapshot.
///
/// The snapshot is valid iff it was taken at the current revision.
pub struct ValueCore {
    notifier: Notifier<Notification>,
    caching: Cell<bool>,
    revision: Cell<u64>,
    cached: RefCell<Option<(u64, JsonValue)>>,
}

impl ValueCore {
    pub(crate) fn new() -> Self {
        Self {
            notifier: Notifier::new(),
            caching: Cell::new(false),
            revision: Cell::new(0),
            cached: RefCell::new(None),
        }
    }

    fn cached_at(&self, revision: u64) -> Option<JsonValue> {
        match self.cached.borrow().as_ref() {
            Some((rev, val)) if *rev == revision => Some(val.clone()),
            _ => None,
        }
    }

    /// Advance the revision and drop the snapshot. Returns the new revision.
    fn bump(&self) -> u64 {
        let next = self.revision.get().wrapping_add(1);
        self.revision.set(next);
        if self.caching.get() {
            self.cached.replace(None);
        }
        next
    }
}

impl fmt::Debug for ValueCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCore")
            .field("caching", &self.caching.get())
            .field("revision", &self.revision.get())
            .field("listener_count", &self.notifier.len())
            .finish()
    }
}

/// Behaviour shared by all reactive values.
///
/// Implementors provide raw access (`get_val`/`set_val`) and child lookup;
/// everything else is layered on top by the provided methods. All mutations
/// go through [`Reactive::flush`], which advances the revision before any
/// listener runs, so a listener that reads the value back sees fresh data.
pub trait Reactive {
    fn core(&self) -> &ValueCore;

    /// A type-erased handle to this value, used to tag notifications.
    fn to_value(&self) -> Value;

    /// Compute the current value, bypassing the cache.
    fn get_val(&self) -> JsonValue;

    /// Store `val` without notifying. Returns the value as stored.
    fn set_val(&self, val: JsonValue) -> Result<JsonValue, DataError>;

    /// Look up a direct child by name. Only lists and models have children.
    fn find_property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Current value. With caching on, the snapshot is recomputed only when
    /// the revision moved since it was taken.
    fn value(&self) -> JsonValue {
        let core = self.core();
        if !core.caching.get() {
            return self.get_val();
        }
        let revision = core.revision.get();
        if let Some(hit) = core.cached_at(revision) {
            return hit;
        }
        let val = self.get_val();
        core.cached.replace(Some((revision, val.clone())));
        val
    }

    /// Replace the whole value and emit an `update` notification carrying
    /// the old and new values.
    ///
    /// When `set_val` fails after changing part of the value, the partial
    /// result is still flushed and notified before the error is returned.
    fn set_value(&self, val: JsonValue) -> Result<JsonValue, DataError> {
        let old_val = self.get_val();
        match self.set_val(val) {
            Ok(new_val) => {
                self.flush(Some(Change::Update {
                    old_val: Some(old_val),
                    new_val: Some(new_val.clone()),
                    refresh: false,
                }));
                Ok(new_val)
            }
            Err(err) => {
                let partial = self.get_val();
                if partial != old_val {
                    self.flush(Some(Change::Update {
                        old_val: Some(old_val),
                        new_val: Some(partial),
                        refresh: false,
                    }));
                }
                Err(err)
            }
        }
    }

    /// Record a mutation: advance the revision, then, if a change is given,
    /// tag it with this value and dispatch it.
    fn flush(&self, change: Option<Change>) {
        let core = self.core();
        let revision = core.bump();
        if let Some(change) = change {
            trace!(
                revision,
                kind = change.kind(),
                listeners = core.notifier.len(),
                "dispatching change"
            );
            core.notifier.notify(&Notification {
                change,
                data: self.to_value(),
            });
        }
    }

    /// Emit an `update` notification flagged as a refresh without touching
    /// the data or the revision.
    fn refresh(&self) {
        self.core().notifier.notify(&Notification {
            change: Change::Update {
                old_val: None,
                new_val: None,
                refresh: true,
            },
            data: self.to_value(),
        });
    }

    fn revision(&self) -> u64 {
        self.core().revision.get()
    }

    fn set_caching(&self, caching: bool) {
        let core = self.core();
        core.caching.set(caching);
        if !caching {
            core.cached.replace(None);
        }
    }

    fn is_caching(&self) -> bool {
        self.core().caching.get()
    }

    /// Resolve a dot-delimited path. Returns `None` unless every non-empty
    /// segment resolved.
    fn query(&self, path: &str) -> Option<Value> {
        self.query_names(&parse_path(path))
    }

    /// Resolve a pre-split path.
    fn query_names<S: AsRef<str>>(&self, names: &[S]) -> Option<Value> {
        self.query_names_with(names, |value, left| match left {
            Some(_) => None,
            None => Some(value.clone()),
        })
    }

    /// Resolve a dot-delimited path and hand the deepest resolved value and
    /// the unresolved remainder (if any) to `f`, returning its result.
    fn query_with<R>(&self, path: &str, f: impl FnOnce(&Value, Option<&[String]>) -> R) -> R {
        self.query_names_with(&parse_path(path), f)
    }

    fn query_names_with<S: AsRef<str>, R>(
        &self,
        names: &[S],
        f: impl FnOnce(&Value, Option<&[String]>) -> R,
    ) -> R {
        let mut current = self.to_value();
        let mut left: Option<Vec<String>> = None;
        for (i, name) in names.iter().enumerate() {
            let name = name.as_ref();
            if name.is_empty() {
                continue;
            }
            match current.find_property(name) {
                Some(next) => current = next,
                None => {
                    left = Some(names[i..].iter().map(|s| s.as_ref().to_string()).collect());
                    break;
                }
            }
        }
        if let Some(left) = &left {
            trace!(unresolved = %format_path(left), kind = current.kind(), "query stopped early");
        }
        f(&current, left.as_deref())
    }
}

/// A handle to any reactive value.
///
/// Cloning shares the underlying value. Use [`Value::ptr_eq`] for identity.
#[derive(Clone)]
pub enum Value {
    Scalar(Scalar),
    List(List),
    Model(Model),
}

impl Value {
    /// `"scalar"`, `"list"` or `"model"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::List(_) => "list",
            Value::Model(_) => "model",
        }
    }

    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => a.ptr_eq(b),
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Model(a), Value::Model(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Value::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }
}

impl Reactive for Value {
    fn core(&self) -> &ValueCore {
        match self {
            Value::Scalar(s) => s.core(),
            Value::List(l) => l.core(),
            Value::Model(m) => m.core(),
        }
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn get_val(&self) -> JsonValue {
        match self {
            Value::Scalar(s) => s.get_val(),
            Value::List(l) => l.get_val(),
            Value::Model(m) => m.get_val(),
        }
    }

    fn set_val(&self, val: JsonValue) -> Result<JsonValue, DataError> {
        match self {
            Value::Scalar(s) => s.set_val(val),
            Value::List(l) => l.set_val(val),
            Value::Model(m) => m.set_val(val),
        }
    }

    fn find_property(&self, name: &str) -> Option<Value> {
        match self {
            Value::Scalar(_) => None,
            Value::List(l) => l.find_property(name),
            Value::Model(m) => m.find_property(name),
        }
    }
}

impl Observable<Notification> for Value {
    fn notifier(&self) -> &Notifier<Notification> {
        &self.core().notifier
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(s) => fmt::Debug::fmt(s, f),
            Value::List(l) => fmt::Debug::fmt(l, f),
            Value::Model(m) => fmt::Debug::fmt(m, f),
        }
    }
}

impl From<Scalar> for Value {
    fn from(v: Scalar) -> Self {
        Value::Scalar(v)
    }
}

impl From<List> for Value {
    fn from(v: List) -> Self {
        Value::List(v)
    }
}

impl From<Model> for Value {
    fn from(v: Model) -> Self {
        Value::Model(v)
    }
}

/// Short name of a JSON value's shape, for error messages.
pub(crate) fn json_kind(val: &JsonValue) -> &'static str {
    match val {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
