//! Path utilities for the storage layer.
//!
//! Provides path validation and normalization.

use super::error::VfsError;

/// Validate that a path is well-formed.
///
/// Relative paths are allowed; they are resolved against the storage root.
pub fn validate_path(path: &str) -> Result<(), VfsError> {
    if path.is_empty() {
        return Err(VfsError::invalid_path("Empty path"));
    }

    if path.contains('\0') {
        return Err(VfsError::invalid_path("Path contains null character"));
    }

    Ok(())
}

/// Normalize a path by resolving `.` and `..` components and removing redundant slashes.
///
/// The result is always absolute: `./System/x` and `System/x` both become `/System/x`.
pub fn normalize_path(path: &str) -> Result<String, VfsError> {
    validate_path(path)?;

    let mut components: Vec<&str> = Vec::new();

    for component in path.split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                if components.pop().is_none() {
                    return Err(VfsError::invalid_path("Path escapes root directory"));
                }
            }
            c => components.push(c),
        }
    }

    if components.is_empty() {
        Ok(String::from("/"))
    } else {
        let mut result = String::new();
        for component in components {
            result.push('/');
            result.push_str(component);
        }
        Ok(result)
    }
}

/// Get the parent path of a normalized path.
pub fn parent_path(path: &str) -> String {
    match path.rfind('/') {
        Some(0) | None => String::from("/"),
        Some(pos) => String::from(&path[..pos]),
    }
}

/// Get the filename (last component) of a path.
pub fn filename(path: &str) -> &str {
    if path == "/" {
        return "";
    }

    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Join two path components.
pub fn join_path(base: &str, name: &str) -> String {
    if base == "/" || base.is_empty() {
        format!("/{}", name)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), name)
    }
}
