//! Sparse reactive lists.
//!
//! # Splice vs. patch
//!
//! [`List::insert`] and [`List::remove`] have dense splice semantics: they
//! shift every later index and change the length. [`List::update`] patches
//! slots in place and never shifts anything. Consumers that mirror a list
//! (renderers, for instance) rely on this to decide between repositioning
//! and patching, so the two must not be mixed up.
//!
//! Holes are first-class: a slot may be empty while later slots are
//! populated. The length counts holes.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use data_drive_path::parse_index;
use serde_json::Value as JsonValue;
use tracing::debug;

use super::{impl_observable, json_kind, Reactive, Value, ValueCore};
use crate::error::DataError;
use crate::notification::{Change, ItemsOp};
use crate::types::TypeRef;

/// How many slots past the current end a single `update` may write.
pub const MAX_GROWTH: usize = 1 << 16;

/// One position of an input sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Nothing at this position. Skipped by `update`, kept as a hole by
    /// `insert` and `set_slots`.
    Hole,
    /// Explicitly undefined. `update` deletes the child here; `insert`
    /// builds a child holding `null`.
    Unset,
    Value(JsonValue),
}

impl Slot {
    /// The value `update` should write, or `None` when the slot asks for
    /// deletion. `null` counts as deletion.
    fn patch_value(self) -> Option<JsonValue> {
        match self {
            Slot::Value(JsonValue::Null) | Slot::Unset | Slot::Hole => None,
            Slot::Value(v) => Some(v),
        }
    }
}

/// An input sequence for list operations.
///
/// A JSON array becomes one [`Slot::Value`] per element, `null` becomes the
/// empty sequence and any other JSON value becomes a one-slot sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Items(pub Vec<Slot>);

impl Items {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<JsonValue> for Items {
    fn from(val: JsonValue) -> Self {
        match val {
            JsonValue::Null => Items::default(),
            JsonValue::Array(arr) => Items(arr.into_iter().map(Slot::Value).collect()),
            other => Items(vec![Slot::Value(other)]),
        }
    }
}

impl From<Vec<Slot>> for Items {
    fn from(slots: Vec<Slot>) -> Self {
        Items(slots)
    }
}

impl From<Vec<JsonValue>> for Items {
    fn from(values: Vec<JsonValue>) -> Self {
        Items(values.into_iter().map(Slot::Value).collect())
    }
}

/// `None` entries are holes.
impl From<Vec<Option<JsonValue>>> for Items {
    fn from(values: Vec<Option<JsonValue>>) -> Self {
        Items(
            values
                .into_iter()
                .map(|v| v.map_or(Slot::Hole, Slot::Value))
                .collect(),
        )
    }
}

/// An ordered, sparse sequence of child values of one item type.
#[derive(Clone)]
pub struct List {
    inner: Rc<ListInner>,
}

struct ListInner {
    core: ValueCore,
    item_type: TypeRef,
    items: RefCell<Vec<Option<Value>>>,
}

impl List {
    pub fn new(item_type: TypeRef) -> Self {
        Self {
            inner: Rc::new(ListInner {
                core: ValueCore::new(),
                item_type,
                items: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn ptr_eq(&self, other: &List) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn item_type(&self) -> &TypeRef {
        &self.inner.item_type
    }

    /// Number of slots, holes included.
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// The child at `index`, or `None` for holes and out-of-range indices.
    pub fn at(&self, index: usize) -> Option<Value> {
        self.inner.items.borrow().get(index).cloned().flatten()
    }

    /// The value of the child at `index`.
    pub fn val_at(&self, index: usize) -> Option<JsonValue> {
        self.at(index).map(|item| item.value())
    }

    pub fn children(&self) -> Vec<Option<Value>> {
        self.inner.items.borrow().clone()
    }

    /// The current values with holes kept as `None`.
    pub fn slots(&self) -> Vec<Option<JsonValue>> {
        self.children()
            .into_iter()
            .map(|item| item.map(|v| v.value()))
            .collect()
    }

    /// Replace the whole sequence, keeping holes, and emit an `update`
    /// notification like [`Reactive::set_value`].
    pub fn set_slots(&self, items: impl Into<Items>) -> Result<JsonValue, DataError> {
        let old_val = self.get_val();
        let children = self.create_items(items.into())?;
        self.inner.items.replace(children);
        let new_val = self.get_val();
        self.flush(Some(Change::Update {
            old_val: Some(old_val),
            new_val: Some(new_val.clone()),
            refresh: false,
        }));
        Ok(new_val)
    }

    /// Splice new children in at `index`, shifting later ones.
    ///
    /// Empty input is a no-op. An `index` past the end appends.
    pub fn insert(&self, index: usize, items: impl Into<Items>) -> Result<&Self, DataError> {
        let items = items.into();
        if items.is_empty() {
            return Ok(self);
        }
        let values = self.create_items(items)?;
        let index = {
            let mut slots = self.inner.items.borrow_mut();
            let at = index.min(slots.len());
            slots.splice(at..at, values.iter().cloned());
            at
        };
        debug!(index, count = values.len(), "list insert");
        self.flush(Some(Change::Items {
            op: ItemsOp::Insert,
            index,
            items: values,
        }));
        Ok(self)
    }

    /// Remove `count` children starting at `index`, shifting later ones.
    ///
    /// A `count` of 0 removes one child; a negative `count` removes through
    /// the end. Nothing is emitted when nothing was removed.
    pub fn remove(&self, index: usize, count: isize) -> &Self {
        let removed: Vec<Option<Value>> = {
            let mut slots = self.inner.items.borrow_mut();
            let len = slots.len();
            if index >= len {
                Vec::new()
            } else {
                let count = match count {
                    0 => 1,
                    c if c < 0 => len - index,
                    c => c.unsigned_abs(),
                };
                let end = index.saturating_add(count).min(len);
                slots.drain(index..end).collect()
            }
        };
        if removed.is_empty() {
            return self;
        }
        debug!(index, count = removed.len(), "list remove");
        self.flush(Some(Change::Items {
            op: ItemsOp::Remove,
            index,
            items: removed,
        }));
        self
    }

    /// Patch slots in place starting at `index`, never shifting anything.
    ///
    /// Per slot of the patch: a hole is skipped; an unset (or `null`) entry
    /// deletes the child there, leaving a hole; a value either overwrites the
    /// existing child's value or builds a new child in the empty slot. The
    /// single `update` notification reports the first touched index and the
    /// touched children relative to it, with untouched or deleted slots as
    /// `None`.
    ///
    /// Slots within the current length never change it. Writing past the
    /// end grows the list up to the written slot, by at most [`MAX_GROWTH`]
    /// slots; writes further out fail with `IndexOutOfRange` before anything
    /// is changed.
    ///
    /// If a slot fails after earlier slots were applied, the applied part is
    /// still flushed and notified before the error is returned.
    pub fn update(&self, index: usize, items: impl Into<Items>) -> Result<&Self, DataError> {
        let items = items.into();
        self.check_patch_range(index, &items)?;

        let mut first: Option<usize> = None;
        let mut touched: Vec<Option<Value>> = Vec::new();
        let mut outcome = Ok(());

        for (offset, slot) in items.0.into_iter().enumerate() {
            if slot == Slot::Hole {
                continue;
            }
            // Range checked above.
            let at = index + offset;
            let existing = self.at(at);
            let patch = slot.patch_value();
            let child = match (existing, patch) {
                (None, None) => continue,
                (Some(_), None) => {
                    self.put(at, None);
                    None
                }
                (None, Some(val)) => match self.create_item(val) {
                    Ok(child) => {
                        self.put(at, Some(child.clone()));
                        Some(child)
                    }
                    Err(err) => {
                        outcome = Err(err);
                        break;
                    }
                },
                (Some(child), Some(val)) => {
                    // A failed write may still have changed part of the child.
                    if let Err(err) = child.set_value(val) {
                        outcome = Err(err);
                    }
                    Some(child)
                }
            };
            let base = *first.get_or_insert(at);
            let rel = at - base;
            if touched.len() <= rel {
                touched.resize(rel + 1, None);
            }
            touched[rel] = child;
            if outcome.is_err() {
                break;
            }
        }

        if let Some(index) = first {
            self.flush(Some(Change::Items {
                op: ItemsOp::Update,
                index,
                items: touched,
            }));
        }
        outcome.map(|()| self)
    }

    /// Reject patches whose value slots overflow or reach further than
    /// [`MAX_GROWTH`] past the end.
    fn check_patch_range(&self, index: usize, items: &Items) -> Result<(), DataError> {
        let len = self.len();
        let limit = len.saturating_add(MAX_GROWTH);
        for (offset, slot) in items.0.iter().enumerate() {
            if *slot == Slot::Hole {
                continue;
            }
            let at = index
                .checked_add(offset)
                .ok_or(DataError::IndexOutOfRange { index, len })?;
            let writes = matches!(slot, Slot::Value(v) if !v.is_null());
            if writes && at >= limit {
                return Err(DataError::IndexOutOfRange { index: at, len });
            }
        }
        Ok(())
    }

    /// `insert` at the current length.
    pub fn append(&self, items: impl Into<Items>) -> Result<&Self, DataError> {
        self.insert(self.len(), items)
    }

    fn put(&self, at: usize, child: Option<Value>) {
        let mut slots = self.inner.items.borrow_mut();
        if at >= slots.len() {
            if child.is_none() {
                return;
            }
            slots.resize(at + 1, None);
        }
        slots[at] = child;
    }

    fn create_item(&self, val: JsonValue) -> Result<Value, DataError> {
        let item = self.inner.item_type.create_value()?;
        item.set_value(val)?;
        Ok(item)
    }

    fn create_items(&self, items: Items) -> Result<Vec<Option<Value>>, DataError> {
        items
            .0
            .into_iter()
            .map(|slot| match slot {
                Slot::Hole => Ok(None),
                Slot::Unset => self.create_item(JsonValue::Null).map(Some),
                Slot::Value(val) => self.create_item(val).map(Some),
            })
            .collect()
    }
}

impl Reactive for List {
    fn core(&self) -> &ValueCore {
        &self.inner.core
    }

    fn to_value(&self) -> Value {
        Value::List(self.clone())
    }

    /// Holes read as `null`; see [`List::slots`] to tell them apart.
    fn get_val(&self) -> JsonValue {
        JsonValue::Array(
            self.slots()
                .into_iter()
                .map(|v| v.unwrap_or(JsonValue::Null))
                .collect(),
        )
    }

    fn set_val(&self, val: JsonValue) -> Result<JsonValue, DataError> {
        if !matches!(val, JsonValue::Array(_) | JsonValue::Null) {
            return Err(DataError::type_kind(format!(
                "items is not an array: got {}",
                json_kind(&val)
            )));
        }
        let children = self.create_items(Items::from(val))?;
        self.inner.items.replace(children);
        Ok(self.get_val())
    }

    fn find_property(&self, name: &str) -> Option<Value> {
        parse_index(name).and_then(|index| self.at(index))
    }
}

impl_observable!(List);

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("item_type", &self.inner.item_type)
            .field("len", &self.len())
            .field("core", &self.inner.core)
            .finish()
    }
}
