//! Path rules shared by the adapter and the local backends.

use crate::error::{StoreError, StoreResult};

/// Check that a relative store path cannot escape its root.
///
/// Paths are `/`-separated, relative, with non-empty components that are
/// neither `.` nor `..` and carry no backslashes.
pub fn validate_path(path: &str) -> StoreResult<()> {
    let invalid = |reason: &str| StoreError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    if path.is_empty() {
        return Err(invalid("path must not be empty"));
    }
    if path.starts_with('/') {
        return Err(invalid("path must be relative"));
    }
    if path.contains('\\') {
        return Err(invalid("backslashes are not allowed"));
    }
    for component in path.split('/') {
        match component {
            "" => return Err(invalid("empty path component")),
            "." | ".." => return Err(invalid("relative components are not allowed")),
            c if c.starts_with('.') => return Err(invalid("hidden components are reserved")),
            _ => {}
        }
    }
    Ok(())
}

/// Prefix `path` with the data root, if one is configured.
pub fn join(root: &str, path: &str) -> String {
    let root = root.trim_matches('/');
    if root.is_empty() {
        path.to_string()
    } else {
        format!("{root}/{path}")
    }
}
