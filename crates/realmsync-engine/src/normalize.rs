//! Diff/patch engine: canonicalization, deep clone, deep patch, deep
//! equality over JSON trees.
//!
//! Every resource type's update path is `patch(existing, desired)` followed
//! by a write only when the result differs from `existing`. Centralizing the
//! merge here removes per-type diff code and gives every importer the same
//! semantics:
//!
//! - `null` is "absent": it never erases a field the server holds,
//! - list-valued fields are replaced wholesale, never element-merged,
//! - object-valued fields merge recursively,
//! - ignored dotted paths can be stripped at arbitrary depth.
//!
//! The canonicalizer is an explicit, injected instance; there is no static
//! serializer or process-wide cache behind it.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::error::{ImportError, ImportResult};

/// Canonicalizing serializer shared by the diff/patch engine and the
/// checksum service.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer;

impl Canonicalizer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Serialize a resource into its canonical JSON form: stable key order
    /// (BTree-backed maps) with explicit nulls stripped.
    pub fn canonicalize<T: Serialize>(&self, value: &T) -> ImportResult<Value> {
        let mut tree = serde_json::to_value(value)
            .map_err(|e| ImportError::processing(format!("cannot canonicalize object: {e}")))?;
        strip_nulls(&mut tree);
        Ok(tree)
    }

    /// Canonical byte form, used by the checksum service.
    pub fn canonical_bytes<T: Serialize>(&self, value: &T) -> ImportResult<Vec<u8>> {
        let tree = self.canonicalize(value)?;
        serde_json::to_vec(&tree)
            .map_err(|e| ImportError::processing(format!("cannot serialize canonical form: {e}")))
    }

    /// Deep copy with dotted paths removed at arbitrary depth.
    #[must_use]
    pub fn clone_value(&self, value: &Value, ignored_paths: &[&str]) -> Value {
        let mut cloned = value.clone();
        for path in ignored_paths {
            remove_path(&mut cloned, path);
        }
        cloned
    }

    /// Overlay every present field of `source` onto a clone of `target`.
    ///
    /// Ignored paths are stripped from the overlay, so they can never
    /// overwrite what the server holds.
    #[must_use]
    pub fn patch(&self, target: &Value, source: &Value, ignored_paths: &[&str]) -> Value {
        let overlay = self.clone_value(source, ignored_paths);
        let mut merged = target.clone();
        merge_into(&mut merged, &overlay);
        merged
    }

    /// Structural equality after stripping ignored paths from both sides.
    #[must_use]
    pub fn equals(&self, a: &Value, b: &Value, ignored_paths: &[&str]) -> bool {
        self.clone_value(a, ignored_paths) == self.clone_value(b, ignored_paths)
    }

    /// Typed patch: merge `desired` over `existing` and decode back.
    pub fn patch_resource<T>(&self, existing: &T, desired: &T, ignored_paths: &[&str]) -> ImportResult<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let existing_tree = self.canonicalize(existing)?;
        let desired_tree = self.canonicalize(desired)?;
        let merged = self.patch(&existing_tree, &desired_tree, ignored_paths);
        serde_json::from_value(merged)
            .map_err(|e| ImportError::processing(format!("patched object does not decode: {e}")))
    }

    /// Typed comparison: would `patch(existing, desired)` change anything?
    pub fn resource_needs_update<T: Serialize>(
        &self,
        existing: &T,
        desired: &T,
        ignored_paths: &[&str],
    ) -> ImportResult<bool> {
        let existing_tree = self.canonicalize(existing)?;
        let desired_tree = self.canonicalize(desired)?;
        let merged = self.patch(&existing_tree, &desired_tree, ignored_paths);
        Ok(!self.equals(&existing_tree, &merged, ignored_paths))
    }
}

/// Remove explicit nulls: a null member means "not declared", and must
/// neither overwrite remote values nor participate in equality.
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            for v in map.values_mut() {
                strip_nulls(v);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                strip_nulls(item);
            }
        }
        _ => {}
    }
}

/// Remove a dotted path; intermediate arrays apply the remainder of the
/// path to each element.
fn remove_path(value: &mut Value, path: &str) {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };

    match value {
        Value::Object(map) => match rest {
            None => {
                map.remove(head);
            }
            Some(rest) => {
                if let Some(child) = map.get_mut(head) {
                    remove_path(child, rest);
                }
            }
        },
        Value::Array(items) => {
            for item in items.iter_mut() {
                remove_path(item, path);
            }
        }
        _ => {}
    }
}

/// Merge `source` into `target`: objects recurse, everything else
/// (including arrays) replaces wholesale.
fn merge_into(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, source_value) in source_map {
                if source_value.is_null() {
                    continue;
                }
                match target_map.get_mut(key) {
                    Some(target_value) if target_value.is_object() && source_value.is_object() => {
                        merge_into(target_value, source_value);
                    }
                    _ => {
                        target_map.insert(key.clone(), source_value.clone());
                    }
                }
            }
        }
        (target, source) => {
            if !source.is_null() {
                *target = source.clone();
            }
        }
    }
}
