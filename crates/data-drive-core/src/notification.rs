use serde_json::Value as JsonValue;

use crate::value::Value;

/// Structural list operation carried by [`Change::Items`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemsOp {
    Insert,
    Remove,
    Update,
}

impl ItemsOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemsOp::Insert => "insert",
            ItemsOp::Remove => "remove",
            ItemsOp::Update => "update",
        }
    }
}

/// What changed.
#[derive(Debug, Clone)]
pub enum Change {
    /// The whole value was replaced through `set_value`, or a refresh was
    /// requested. A refresh carries no values and `refresh == true`.
    Update {
        old_val: Option<JsonValue>,
        new_val: Option<JsonValue>,
        refresh: bool,
    },
    /// A list changed structurally (`insert`/`remove`) or in place (`update`).
    ///
    /// `items` is indexed relative to `index`. For `update`, slots inside the
    /// reported span that were not touched, or were deleted, are `None`.
    Items {
        op: ItemsOp,
        index: usize,
        items: Vec<Option<Value>>,
    },
    /// A single model property was assigned through `set_property`.
    Property { name: String, value: JsonValue },
}

impl Change {
    /// Wire name of the change kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Change::Update { .. } => "update",
            Change::Items { .. } => "items",
            Change::Property { .. } => "property",
        }
    }

    pub fn is_refresh(&self) -> bool {
        matches!(self, Change::Update { refresh: true, .. })
    }
}

/// A change tagged with the value that emitted it.
#[derive(Debug, Clone)]
pub struct Notification {
    pub change: Change,
    pub data: Value,
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        self.change.kind()
    }

    pub fn op(&self) -> Option<ItemsOp> {
        match &self.change {
            Change::Items { op, .. } => Some(*op),
            _ => None,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match &self.change {
            Change::Items { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn items(&self) -> &[Option<Value>] {
        match &self.change {
            Change::Items { items, .. } => items,
            _ => &[],
        }
    }
}
