//! Reactive data model: observable scalars, sparse lists and schema-built
//! models that report fine-grained changes to their subscribers.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use data_drive_core::{Listener, Reactive, Schema, TypeRef};
//! use serde_json::json;
//!
//! let schema = Schema::builder()
//!     .scalar("name")
//!     .list("emails", TypeRef::Scalar)
//!     .build();
//! let user = schema.create_model().unwrap();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! let listener = Listener::new(move |n: &data_drive_core::Notification| {
//!     sink.borrow_mut().push(n.kind());
//! });
//! let emails = user.list("emails").unwrap();
//! listener.listen(&emails);
//!
//! emails.append(json!(["dd@example.com"])).unwrap();
//! assert_eq!(user.value(), json!({"name": null, "emails": ["dd@example.com"]}));
//! assert_eq!(*seen.borrow(), vec!["items"]);
//! assert!(user.query("emails.0").is_some());
//! ```

pub mod error;
pub mod model_registry;
pub mod notification;
pub mod notifier;
pub mod types;
pub mod value;

pub use error::DataError;
pub use model_registry::ModelRegistry;
pub use notification::{Change, ItemsOp, Notification};
pub use notifier::{Callback, Listener, Notifier, Observable};
pub use types::{
    create_value, ScalarOptions, ScalarType, Schema, SchemaBuilder, SchemaExtension,
    SchemaOptions, Type, TypeRef, TypeRegistry,
};
pub use value::{
    Items, List, Model, Property, Reactive, Scalar, Slot, Value, ValueCore, MAX_GROWTH,
};

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
