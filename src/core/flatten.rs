//! Purpose: Collapse nested JSON objects into their leaf key-value pairs.
//! Exports: `flatten`, `flatten_with`, `FlattenOptions`, `CollisionPolicy`, `FlattenReport`.
//! Role: Pure core; no I/O, input is read-only.
//! Invariants: Parent keys are discarded; every leaf keeps its own key.
//! Invariants: Non-object input and unsupported leaf shapes contribute nothing.
//! Invariants: Traversal is depth-first with keys in map order, so output is
//! deterministic for a given input.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::core::error::{Error, ErrorKind};

/// What to do when the same leaf key appears in more than one branch.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum CollisionPolicy {
    /// Keep the value inserted last in traversal order.
    #[default]
    LastKeyWins,
    /// Fail on the first duplicate leaf key.
    Reject,
}

#[derive(Copy, Clone, Debug, Default)]
pub struct FlattenOptions {
    pub collisions: CollisionPolicy,
}

/// Flat pairs plus accounting for entries that degraded instead of erroring.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FlattenReport {
    pub pairs: BTreeMap<String, String>,
    /// Values that were neither strings nor objects.
    pub skipped: u64,
    /// Leaf keys overwritten by a later branch (lenient policy only).
    pub shadowed: u64,
}

/// Flatten a nested mapping with the default lenient policy.
///
/// Each level allocates its own map and merges it upward after the recursive
/// call returns; a level holding only string values is the base case. A value
/// that is not an object at all yields an empty map.
pub fn flatten(value: &Value) -> BTreeMap<String, String> {
    let Value::Object(map) = value else {
        return BTreeMap::new();
    };
    let mut pairs = BTreeMap::new();
    for (key, entry) in map {
        match entry {
            Value::String(text) => {
                pairs.insert(key.clone(), text.clone());
            }
            Value::Object(_) => {
                for (leaf_key, leaf_value) in flatten(entry) {
                    pairs.insert(leaf_key, leaf_value);
                }
            }
            // Unsupported leaf shapes contribute nothing.
            _ => {}
        }
    }
    pairs
}

/// Flatten with an explicit collision policy and skip/shadow accounting.
///
/// Under `LastKeyWins` this never fails and its pairs equal `flatten`'s.
pub fn flatten_with(value: &Value, options: &FlattenOptions) -> Result<FlattenReport, Error> {
    let mut report = FlattenReport::default();
    if let Value::Object(map) = value {
        collect(map, options, &mut report)?;
    }
    Ok(report)
}

fn collect(
    map: &Map<String, Value>,
    options: &FlattenOptions,
    report: &mut FlattenReport,
) -> Result<(), Error> {
    for (key, entry) in map {
        match entry {
            Value::String(text) => insert_leaf(key, text, options, report)?,
            Value::Object(inner) => collect(inner, options, report)?,
            _ => report.skipped += 1,
        }
    }
    Ok(())
}

fn insert_leaf(
    key: &str,
    text: &str,
    options: &FlattenOptions,
    report: &mut FlattenReport,
) -> Result<(), Error> {
    let previous = report.pairs.insert(key.to_string(), text.to_string());
    if previous.is_some() {
        match options.collisions {
            CollisionPolicy::LastKeyWins => report.shadowed += 1,
            CollisionPolicy::Reject => {
                return Err(Error::new(ErrorKind::Collision)
                    .with_message("leaf key appears in more than one branch")
                    .with_key(key)
                    .with_hint("Drop --strict to keep the last value in traversal order."));
            }
        }
    }
    Ok(())
}
