/*
 * merge.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Deep merge of rendered values.
//!
//! Merge semantics, for two plain objects:
//! - Objects: deep-merge by key (recursive)
//! - Arrays: concatenate (target first)
//! - Scalars: never overwrite; a collision is a [`MergeConflict`]
//!
//! When either side is not a plain object, the result is an object built the
//! way object spread would build it: the target's entries, then the source's
//! entries on top.

use serde_json::{Map, Value};

use crate::error::MergeConflict;

/// Deep merge `source` into a copy of `target`.
///
/// Neither input is modified. Keys keep `target`'s order, followed by keys
/// first introduced by `source` in `source`'s order.
pub fn deep_merge(target: &Value, source: &Value) -> Result<Value, MergeConflict> {
    let (Value::Object(target_map), Value::Object(source_map)) = (target, source) else {
        return Ok(spread(target, source));
    };

    let mut merged = target_map.clone();
    for (key, incoming) in source_map {
        match incoming {
            Value::Object(_) => {
                let value = match merged.get(key) {
                    Some(existing) => {
                        deep_merge(existing, incoming).map_err(|e| e.nested_under(key))?
                    }
                    None => incoming.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Array(items) => match merged.get_mut(key) {
                Some(Value::Array(existing)) => existing.extend(items.iter().cloned()),
                _ => {
                    merged.insert(key.clone(), incoming.clone());
                }
            },
            _ => {
                if merged.contains_key(key) {
                    return Err(MergeConflict { key: key.clone() });
                }
                merged.insert(key.clone(), incoming.clone());
            }
        }
    }
    Ok(Value::Object(merged))
}

/// Merge values left to right, starting from an empty object.
pub fn merge_all<'a>(values: impl IntoIterator<Item = &'a Value>) -> Result<Value, MergeConflict> {
    values
        .into_iter()
        .try_fold(Value::Object(Map::new()), |acc, value| deep_merge(&acc, value))
}

fn spread(target: &Value, source: &Value) -> Value {
    let mut merged = Map::new();
    spread_into(&mut merged, target);
    spread_into(&mut merged, source);
    Value::Object(merged)
}

/// Objects contribute their entries, arrays and strings their index keys,
/// other scalars nothing.
fn spread_into(map: &mut Map<String, Value>, value: &Value) {
    match value {
        Value::Object(fields) => {
            for (key, value) in fields {
                map.insert(key.clone(), value.clone());
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                map.insert(index.to_string(), item.clone());
            }
        }
        Value::String(text) => {
            for (index, ch) in text.chars().enumerate() {
                map.insert(index.to_string(), Value::String(ch.to_string()));
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_disjoint_keys_union() {
        let result = deep_merge(&json!({"a": 1}), &json!({"b": 2})).unwrap();
        assert_eq!(result, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_nested_objects_merge() {
        let target = json!({"metadata": {"name": "web", "labels": {"app": "web"}}});
        let source = json!({"metadata": {"labels": {"tier": "frontend"}, "namespace": "prod"}});
        let result = deep_merge(&target, &source).unwrap();
        assert_eq!(
            result,
            json!({
                "metadata": {
                    "name": "web",
                    "labels": {"app": "web", "tier": "frontend"},
                    "namespace": "prod"
                }
            })
        );
    }

    #[test]
    fn test_arrays_concatenate() {
        let result = deep_merge(&json!({"ports": [80]}), &json!({"ports": [443, 8080]})).unwrap();
        assert_eq!(result, json!({"ports": [80, 443, 8080]}));
    }

    #[test]
    fn test_array_replaces_non_array() {
        let result = deep_merge(&json!({"ports": "none"}), &json!({"ports": [443]})).unwrap();
        assert_eq!(result, json!({"ports": [443]}));
    }

    #[test]
    fn test_scalar_collision_conflicts() {
        let err = deep_merge(&json!({"replicas": 1}), &json!({"replicas": 2})).unwrap_err();
        assert_eq!(err.key, "replicas");

        let err = deep_merge(&json!({"replicas": 1}), &json!({"replicas": 1})).unwrap_err();
        assert_eq!(err.key, "replicas");

        let err = deep_merge(&json!({"a": null}), &json!({"a": null})).unwrap_err();
        assert_eq!(err.key, "a");
    }

    #[test]
    fn test_nested_conflict_reports_dotted_key() {
        let err = deep_merge(
            &json!({"spec": {"replicas": 1}}),
            &json!({"spec": {"replicas": 3}}),
        )
        .unwrap_err();
        assert_eq!(err.key, "spec.replicas");
    }

    #[test]
    fn test_key_order() {
        let result = deep_merge(&json!({"b": 1, "a": 2}), &json!({"d": 3, "c": 4})).unwrap();
        let keys: Vec<&String> = result.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["b", "a", "d", "c"]);
    }

    #[test]
    fn test_replacement_keeps_key_position() {
        let result = deep_merge(
            &json!({"first": {"x": 1}, "second": 2}),
            &json!({"first": {"y": 2}}),
        )
        .unwrap();
        let keys: Vec<&String> = result.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["first", "second"]);
    }

    #[test]
    fn test_inputs_are_not_modified() {
        let target = json!({"ports": [80], "meta": {"a": 1}});
        let source = json!({"ports": [443], "meta": {"b": 2}});
        let _ = deep_merge(&target, &source).unwrap();
        assert_eq!(target, json!({"ports": [80], "meta": {"a": 1}}));
        assert_eq!(source, json!({"ports": [443], "meta": {"b": 2}}));
    }

    #[test]
    fn test_object_over_scalar_spreads() {
        let result = deep_merge(&json!({"a": 5}), &json!({"a": {"b": 1}})).unwrap();
        assert_eq!(result, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_non_object_spread() {
        assert_eq!(deep_merge(&json!({}), &json!("ab")).unwrap(), json!({"0": "a", "1": "b"}));
        assert_eq!(
            deep_merge(&json!({"0": "x", "k": 1}), &json!([true])).unwrap(),
            json!({"0": true, "k": 1})
        );
        assert_eq!(deep_merge(&json!({"k": 1}), &json!(7)).unwrap(), json!({"k": 1}));
        assert_eq!(deep_merge(&json!(null), &json!(null)).unwrap(), json!({}));
    }

    #[test]
    fn test_merge_all() {
        let values = [json!({"a": 1}), json!({"b": [1]}), json!({"b": [2]})];
        assert_eq!(merge_all(&values).unwrap(), json!({"a": 1, "b": [1, 2]}));
        assert_eq!(merge_all(&Vec::<Value>::new()).unwrap(), json!({}));
    }
}
