use data_drive_path::ValidationError;
use thiserror::Error;

/// Errors surfaced by the value model.
///
/// These are contract violations raised to the immediate caller. The model
/// never retries and never rolls back partially applied changes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DataError {
    /// A value of the wrong shape was handed to a value or type factory.
    #[error("type kind mismatch: {0}")]
    TypeKind(String),
    /// An abstract capability was invoked without a concrete override.
    #[error("not implemented: {0}")]
    NotImplemented(String),
    #[error("unknown property: {0}")]
    UnknownProperty(String),
    #[error("property already defined: {0}")]
    DuplicateProperty(String),
    #[error("unknown type: {0}")]
    UnknownType(String),
    /// A list write aimed past what the list may grow to.
    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
    /// A property name that no path could address.
    #[error("invalid property name: {0}")]
    InvalidName(#[from] ValidationError),
}

impl DataError {
    pub(crate) fn type_kind(msg: impl Into<String>) -> Self {
        Self::TypeKind(msg.into())
    }
}
