//! Structural merge of desired-state fragments into live objects
//!
//! Every key present in the desired fragment overrides the live value, keys
//! only present in the live object are kept, and lists are replaced
//! wholesale. `metadata.creationTimestamp` always comes from the live side.

use crate::diff;
use crate::error::{Error, Result};
use serde_json::Value;

/// Result of merging one fragment into one live object
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The merged object differs from the live object
    pub changed: bool,
    pub merged: Value,
    /// Line diff from live to merged, empty when unchanged
    pub diff: String,
}

/// Merge `desired` into `live`.
///
/// Both sides must be JSON objects.
pub fn merge(live: &Value, desired: &Value) -> Result<MergeOutcome> {
    if !desired.is_object() {
        return Err(Error::NotAnObject {
            what: "desired fragment".to_string(),
        });
    }
    if !live.is_object() {
        return Err(Error::NotAnObject {
            what: "live object".to_string(),
        });
    }

    let mut merged = live.clone();
    deep_merge(&mut merged, desired);
    preserve_creation_timestamp(live, &mut merged);

    let changed = merged != *live;
    let diff = if changed {
        diff::render(live, &merged)?
    } else {
        String::new()
    };

    Ok(MergeOutcome {
        changed,
        merged,
        diff,
    })
}

/// Recursively overlay `overlay` onto `base`
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value);
                    }
                    _ => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Copy `metadata.creationTimestamp` from `live` into `merged`, or drop it
/// from `merged` when `live` has none
pub fn preserve_creation_timestamp(live: &Value, merged: &mut Value) {
    let timestamp = live.pointer("/metadata/creationTimestamp").cloned();

    let Some(Value::Object(metadata)) = merged.get_mut("metadata") else {
        return;
    };
    match timestamp {
        Some(ts) => {
            metadata.insert("creationTimestamp".to_string(), ts);
        }
        None => {
            metadata.remove("creationTimestamp");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_override() {
        let outcome = merge(&json!({"spec": {"size": 1}}), &json!({"spec": {"size": 3}})).unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.merged, json!({"spec": {"size": 3}}));
        assert!(outcome.diff.lines().any(|l| l == "-    \"size\": 1"));
        assert!(outcome.diff.lines().any(|l| l == "+    \"size\": 3"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let live = json!({"spec": {"size": 1, "zones": ["a"]}, "metadata": {"name": "c"}});
        let desired = json!({"spec": {"size": 3, "zones": ["b", "c"]}});

        let first = merge(&live, &desired).unwrap();
        let second = merge(&first.merged, &desired).unwrap();

        assert!(first.changed);
        assert!(!second.changed);
        assert!(second.diff.is_empty());
        assert_eq!(second.merged, first.merged);
    }

    #[test]
    fn test_desired_wins_including_null() {
        let live = json!({"spec": {"a": 1, "b": {"c": 2}}});
        let desired = json!({"spec": {"a": null, "b": 7}});

        let outcome = merge(&live, &desired).unwrap();
        assert_eq!(outcome.merged, json!({"spec": {"a": null, "b": 7}}));
    }

    #[test]
    fn test_live_only_keys_are_kept() {
        let live = json!({"spec": {"networkCIDR": "10.0.0.0/16", "size": 1}, "status": {}});
        let desired = json!({"spec": {"size": 1}});

        let outcome = merge(&live, &desired).unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.merged, live);
    }

    #[test]
    fn test_lists_are_replaced() {
        let live = json!({"spec": {"subnets": [{"name": "a"}, {"name": "b"}]}});
        let desired = json!({"spec": {"subnets": [{"name": "c"}]}});

        let outcome = merge(&live, &desired).unwrap();
        assert_eq!(outcome.merged, json!({"spec": {"subnets": [{"name": "c"}]}}));
    }

    #[test]
    fn test_creation_timestamp_comes_from_live() {
        let live = json!({"metadata": {"creationTimestamp": "2020-01-01T00:00:00Z", "name": "c"}});
        let desired = json!({"metadata": {"creationTimestamp": null}});

        let outcome = merge(&live, &desired).unwrap();
        assert!(!outcome.changed);
        assert_eq!(
            outcome.merged["metadata"]["creationTimestamp"],
            json!("2020-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_creation_timestamp_removed_when_live_has_none() {
        let live = json!({"metadata": {"name": "c"}});
        let desired = json!({"metadata": {"creationTimestamp": null}});

        let outcome = merge(&live, &desired).unwrap();
        assert!(!outcome.changed);
        assert!(outcome.merged["metadata"].get("creationTimestamp").is_none());
    }

    #[test]
    fn test_non_object_desired_is_rejected() {
        let err = merge(&json!({}), &json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::NotAnObject { .. }));
    }

    #[test]
    fn test_non_object_live_is_rejected() {
        let err = merge(&json!("text"), &json!({})).unwrap_err();
        assert!(matches!(err, Error::NotAnObject { .. }));
    }
}
