//! Three-way merge of (last-applied, live, desired).
//!
//! Rules, applied recursively:
//! - a field set in desired takes the desired value
//! - a field absent from desired but present in last-applied is removed
//! - a field absent from both keeps the live value
//! - lists are replaced as a whole unless the schema names a merge key,
//!   in which case the same three rules apply per element key

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, trace};

use super::schema::KindSchema;
use super::strategy::MergeStrategy;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("incompatible shapes at {path}: live is {live}, desired is {desired}")]
    IncompatibleShape {
        path: String,
        live: &'static str,
        desired: &'static str,
    },
}

/// Merges the user-field trees of one object.
///
/// `last_applied` is `None` when there is no usable merge base; nothing is
/// eligible for removal in that case.
pub fn three_way_merge(
    last_applied: Option<&Map<String, Value>>,
    live: &Map<String, Value>,
    desired: &Map<String, Value>,
    strategy: &MergeStrategy,
) -> Result<Map<String, Value>, MergeError> {
    let merger = Merger {
        schema: strategy.schema(),
    };
    merger.merge_map("", last_applied, live, desired)
}

struct Merger<'a> {
    schema: Option<&'a KindSchema>,
}

impl Merger<'_> {
    fn merge_map(
        &self,
        path: &str,
        original: Option<&Map<String, Value>>,
        live: &Map<String, Value>,
        desired: &Map<String, Value>,
    ) -> Result<Map<String, Value>, MergeError> {
        let mut result = live.clone();

        if let Some(original) = original {
            for key in original.keys() {
                if !desired.contains_key(key) && result.remove(key).is_some() {
                    trace!(path = %join(path, key), "relinquished field");
                }
            }
        }

        for (key, desired_value) in desired {
            let child = join(path, key);
            let merged = self.merge_value(
                &child,
                original.and_then(|o| o.get(key)),
                live.get(key),
                desired_value,
            )?;
            result.insert(key.clone(), merged);
        }

        Ok(result)
    }

    fn merge_value(
        &self,
        path: &str,
        original: Option<&Value>,
        live: Option<&Value>,
        desired: &Value,
    ) -> Result<Value, MergeError> {
        match desired {
            Value::Object(desired_map) => match live {
                None | Some(Value::Null) => Ok(desired.clone()),
                Some(Value::Object(live_map)) => Ok(Value::Object(self.merge_map(
                    path,
                    original.and_then(Value::as_object),
                    live_map,
                    desired_map,
                )?)),
                Some(other) => Err(incompatible(path, other, desired)),
            },
            Value::Array(desired_items) => match live {
                Some(live_value @ Value::Object(_)) => Err(incompatible(path, live_value, desired)),
                _ => match self.schema.and_then(|schema| schema.list_key(path)) {
                    Some(key) => self.merge_keyed_list(
                        path,
                        key,
                        original.and_then(Value::as_array),
                        live.and_then(Value::as_array),
                        desired_items,
                    ),
                    None => Ok(desired.clone()),
                },
            },
            _ => Ok(desired.clone()),
        }
    }

    fn merge_keyed_list(
        &self,
        path: &str,
        key: &str,
        original: Option<&Vec<Value>>,
        live: Option<&Vec<Value>>,
        desired: &[Value],
    ) -> Result<Value, MergeError> {
        let Some(desired_keys) = element_keys(desired, key) else {
            debug!(path, key, "desired list elements lack a unique merge key, replacing whole list");
            return Ok(Value::Array(desired.to_vec()));
        };

        let live: &[Value] = live.map(Vec::as_slice).unwrap_or(&[]);
        let original: &[Value] = original.map(Vec::as_slice).unwrap_or(&[]);
        let element_path = format!("{path}[]");

        let mut merged = Vec::with_capacity(desired.len().max(live.len()));
        for (desired_item, item_key) in desired.iter().zip(&desired_keys) {
            merged.push(self.merge_value(
                &element_path,
                find_by_key(original, key, item_key),
                find_by_key(live, key, item_key),
                desired_item,
            )?);
        }

        for live_item in live {
            match live_item.get(key) {
                Some(live_key) if desired_keys.contains(&live_key) => {}
                Some(live_key) if find_by_key(original, key, live_key).is_some() => {
                    trace!(path, key = %live_key, "relinquished list element");
                }
                _ => merged.push(live_item.clone()),
            }
        }

        Ok(Value::Array(merged))
    }
}

/// Key values of every element, or `None` if any element lacks the key or
/// two elements share one.
fn element_keys<'v>(items: &'v [Value], key: &str) -> Option<Vec<&'v Value>> {
    let mut keys: Vec<&Value> = Vec::with_capacity(items.len());
    for item in items {
        let item_key = item.get(key)?;
        if keys.contains(&item_key) {
            return None;
        }
        keys.push(item_key);
    }
    Some(keys)
}

fn find_by_key<'v>(items: &'v [Value], key: &str, wanted: &Value) -> Option<&'v Value> {
    items.iter().find(|item| item.get(key) == Some(wanted))
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn incompatible(path: &str, live: &Value, desired: &Value) -> MergeError {
    MergeError::IncompatibleShape {
        path: path.to_string(),
        live: shape(live),
        desired: shape(desired),
    }
}

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
