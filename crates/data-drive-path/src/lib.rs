//! Dot-delimited value paths.
//!
//! A path such as `members.1.role` addresses a nested sub-value: each
//! segment names a model property or a list index. This crate holds the
//! string-level helpers behind the reactive model's `query`.
//!
//! # Example
//!
//! ```
//! use data_drive_path::{format_path, parse_index, parse_path};
//!
//! let path = parse_path("members.1.role");
//! assert_eq!(path, vec!["members", "1", "role"]);
//! assert_eq!(format_path(&path), "members.1.role");
//! assert_eq!(parse_index(&path[1]), Some(1));
//! ```

pub mod validate;
pub use validate::{validate_path, ValidationError};

/// Separator between path segments.
pub const SEPARATOR: char = '.';

/// A single path segment: a property name or a decimal list index.
pub type PathStep = String;

/// A parsed path.
pub type Path = Vec<PathStep>;

/// Split a dot-delimited path into segments.
///
/// Empty segments are kept so that callers reporting the unresolved
/// remainder of a path can hand back exactly what was asked for.
///
/// # Example
///
/// ```
/// use data_drive_path::parse_path;
///
/// assert_eq!(parse_path(""), Vec::<String>::new());
/// assert_eq!(parse_path("a.b"), vec!["a", "b"]);
/// assert_eq!(parse_path("a..b"), vec!["a", "", "b"]);
/// ```
pub fn parse_path(path: &str) -> Path {
    if path.is_empty() {
        return Vec::new();
    }
    path.split(SEPARATOR).map(str::to_string).collect()
}

/// Join segments back into a dot-delimited path.
///
/// # Example
///
/// ```
/// use data_drive_path::format_path;
///
/// assert_eq!(format_path::<String>(&[]), "");
/// assert_eq!(format_path(&["items", "3"]), "items.3");
/// ```
pub fn format_path<S: AsRef<str>>(path: &[S]) -> String {
    let mut out = String::new();
    for (i, step) in path.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(step.as_ref());
    }
    out
}

/// Parse a segment as a list index.
///
/// Only plain decimal digits are accepted: no sign, no whitespace and no
/// trailing characters.
///
/// # Example
///
/// ```
/// use data_drive_path::parse_index;
///
/// assert_eq!(parse_index("0"), Some(0));
/// assert_eq!(parse_index("007"), Some(7));
/// assert_eq!(parse_index("-1"), None);
/// assert_eq!(parse_index("1x"), None);
/// assert_eq!(parse_index(""), None);
/// ```
pub fn parse_index(step: &str) -> Option<usize> {
    if step.is_empty() || !step.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    step.parse().ok()
}
