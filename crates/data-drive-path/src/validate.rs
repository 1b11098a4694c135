//! Validation of path segments.

use thiserror::Error;

/// Maximum allowed path depth.
const MAX_PATH_DEPTH: usize = 256;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("PATH_TOO_DEEP")]
    PathTooDeep,
    #[error("invalid path step {0:?}")]
    InvalidPathStep(String),
}

/// Validate a pre-split path.
///
/// A segment may not contain the separator itself, since it could never
/// be produced by [`crate::parse_path`] and would not survive formatting.
///
/// # Example
///
/// ```
/// use data_drive_path::{validate_path, ValidationError};
///
/// validate_path(&["members", "0", "name"]).unwrap();
/// assert_eq!(
///     validate_path(&["a.b"]),
///     Err(ValidationError::InvalidPathStep("a.b".to_string()))
/// );
/// ```
pub fn validate_path<S: AsRef<str>>(path: &[S]) -> Result<(), ValidationError> {
    if path.len() > MAX_PATH_DEPTH {
        return Err(ValidationError::PathTooDeep);
    }
    for step in path {
        let step = step.as_ref();
        if step.contains(crate::SEPARATOR) {
            return Err(ValidationError::InvalidPathStep(step.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_path() {
        assert!(validate_path::<String>(&[]).is_ok());
    }

    #[test]
    fn test_validate_deep_path() {
        let steps: Vec<String> = (0..300).map(|i| i.to_string()).collect();
        assert_eq!(validate_path(&steps), Err(ValidationError::PathTooDeep));
    }

    #[test]
    fn test_validate_max_depth_path() {
        let steps: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        assert!(validate_path(&steps).is_ok());
    }
}
