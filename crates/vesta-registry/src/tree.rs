//! Pure dot-path operations on a JSON tree.
//!
//! These functions know nothing about hives or persistence; [`Registry`]
//! prefixes the hive name and handles the store cell.
//!
//! [`Registry`]: crate::Registry

use serde_json::{Map, Value};

use crate::error::RegistryError;

/// Split a dotted path into segments, rejecting empty segments.
pub fn split_path(path: &str) -> Result<Vec<&str>, RegistryError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(RegistryError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

/// Read the node at `segments`. `None` when any segment is absent.
pub fn get<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |node, segment| node.as_object()?.get(*segment))
}

/// Write `value` at `segments`, creating intermediate objects.
///
/// A `Value::Null` removes the leaf instead. Removing a leaf under a missing
/// parent is a no-op.
pub fn set(root: &mut Value, segments: &[&str], value: Value) -> Result<(), RegistryError> {
    let Some((leaf, parents)) = segments.split_last() else {
        return Err(RegistryError::InvalidPath(String::new()));
    };

    if !root.is_object() {
        *root = Value::Object(Map::new());
    }

    let mut node = root;
    for (depth, segment) in parents.iter().enumerate() {
        let map = node
            .as_object_mut()
            .ok_or_else(|| not_an_object(&segments[..depth]))?;

        if value.is_null() && !map.contains_key(*segment) {
            return Ok(());
        }

        node = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !node.is_object() {
            return Err(not_an_object(&segments[..=depth]));
        }
    }

    let map = node
        .as_object_mut()
        .ok_or_else(|| not_an_object(parents))?;
    if value.is_null() {
        map.remove(*leaf);
    } else {
        map.insert(leaf.to_string(), value);
    }
    Ok(())
}

fn not_an_object(segments: &[&str]) -> RegistryError {
    RegistryError::NotAnObject {
        path: segments.join("."),
    }
}
