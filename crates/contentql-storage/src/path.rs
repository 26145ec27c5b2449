//! Absolute node path helpers shared by backends.

use crate::StorageError;

/// Path of a workspace root node.
pub const ROOT: &str = "/";

/// Normalizes an absolute node path.
///
/// Trailing slashes are dropped and an empty input means the root. Relative
/// paths and empty segments (`/a//b`) are rejected.
///
/// # Errors
///
/// Returns `StorageError::InvalidPath` for malformed paths.
pub fn normalize(path: &str) -> Result<String, StorageError> {
    if path.is_empty() || path == ROOT {
        return Ok(ROOT.to_string());
    }
    if !path.starts_with('/') {
        return Err(StorageError::invalid_path(path));
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(ROOT.to_string());
    }
    if trimmed[1..].split('/').any(|segment| segment.is_empty()) {
        return Err(StorageError::invalid_path(path));
    }
    Ok(trimmed.to_string())
}

/// Joins a child name onto a normalized parent path.
pub fn join(parent: &str, name: &str) -> String {
    if parent == ROOT {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Last segment of a normalized path, empty for the root.
pub fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}
