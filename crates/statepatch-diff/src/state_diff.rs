//! Shallow state diff: compare the top-level keys of two states.
//!
//! Values are compared as wholes, so the change list only ever holds
//! `updated` and `removed` records, and a changed nested mapping or sequence
//! is sent in full.

use statepatch_types::{State, Value};

use crate::change::ChangeRecord;
use crate::error::{DiffError, DiffResult, KeyPath};
use crate::tree_diff::Equality;

/// Compute the shallow diff between two states, comparing by identity.
///
/// Keys of `new` whose values changed (or that `old` lacks) are `Updated`;
/// keys only `old` has are `Removed`.
pub fn diff_shallow(old: &State, new: &State) -> Vec<ChangeRecord> {
    diff_shallow_with(old, new, Equality::Identity)
}

pub fn diff_shallow_with(old: &State, new: &State, equality: Equality) -> Vec<ChangeRecord> {
    let mut changes = Vec::new();

    for (key, new_val) in new {
        let unchanged = old
            .get(key)
            .is_some_and(|old_val| equality.same(old_val, new_val));
        if !unchanged {
            changes.push(ChangeRecord::Updated {
                key: key.clone(),
                value: new_val.clone(),
            });
        }
    }

    for key in old.keys() {
        if !new.contains_key(key) {
            changes.push(ChangeRecord::Removed { key: key.clone() });
        }
    }

    changes
}

/// Apply a shallow change list.
///
/// Nested records are rejected with [`DiffError::UnsupportedChange`]; they
/// can only come from the tree differ and belong to [`crate::patch_tree`].
pub fn patch_shallow(old: &State, changes: &[ChangeRecord]) -> DiffResult<State> {
    if changes.is_empty() {
        return Ok(old.clone());
    }

    let mut map = old.to_map();
    for change in changes {
        match change {
            ChangeRecord::Updated { key, value } => {
                map.insert(key.clone(), value.clone());
            }
            ChangeRecord::Removed { key } => {
                map.remove(key);
            }
            nested => {
                return Err(DiffError::UnsupportedChange {
                    path: KeyPath::from(&[nested.key()][..]),
                    change: nested.tag(),
                })
            }
        }
    }
    Ok(State::from_map(map))
}

/// [`patch_shallow`] for a value that must be a mapping.
pub fn patch_shallow_value(old: &Value, changes: &[ChangeRecord]) -> DiffResult<Value> {
    patch_shallow(old.try_object()?, changes).map(Value::Object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeStats;
    use serde_json::json;

    fn make_state(pairs: &[(&str, serde_json::Value)]) -> State {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(v.clone())))
            .collect()
    }

    #[test]
    fn identical_states_no_diff() {
        let state = make_state(&[("a", json!(1)), ("b", json!("hello"))]);
        assert!(diff_shallow(&state, &state).is_empty());
    }

    #[test]
    fn empty_to_populated() {
        let new = make_state(&[("x", json!(42)), ("y", json!("new"))]);

        let diff = diff_shallow(&State::new(), &new);
        let stats = ChangeStats::of(&diff);
        assert_eq!(diff.len(), 2);
        assert_eq!(stats.updated, 2);
        assert_eq!(stats.removed, 0);
    }

    #[test]
    fn populated_to_empty() {
        let old = make_state(&[("x", json!(42))]);

        let diff = diff_shallow(&old, &State::new());
        assert_eq!(diff, vec![ChangeRecord::Removed { key: "x".into() }]);
    }

    #[test]
    fn mixed_changes() {
        let old = make_state(&[
            ("keep", json!(true)),
            ("modify", json!("old")),
            ("remove", json!(42)),
        ]);
        let new = make_state(&[
            ("keep", json!(true)),
            ("modify", json!("new")),
            ("added", json!([1, 2, 3])),
        ]);

        let diff = diff_shallow(&old, &new);
        assert_eq!(
            serde_json::to_value(&diff).unwrap(),
            json!([
                {"key": "added", "change": "updated", "value": [1, 2, 3]},
                {"key": "modify", "change": "updated", "value": "new"},
                {"key": "remove", "change": "removed"},
            ])
        );
    }

    #[test]
    fn nested_values_are_sent_whole() {
        let old = make_state(&[("config", json!({"debug": false, "port": 8080}))]);
        let new = make_state(&[("config", json!({"debug": true, "port": 8080}))]);

        let diff = diff_shallow(&old, &new);
        assert_eq!(
            serde_json::to_value(&diff).unwrap(),
            json!([{"key": "config", "change": "updated", "value": {"debug": true, "port": 8080}}])
        );
    }

    #[test]
    fn identity_vs_structural() {
        let old = make_state(&[("config", json!({"port": 8080}))]);
        let new = make_state(&[("config", json!({"port": 8080}))]);
        assert_eq!(diff_shallow(&old, &new).len(), 1);
        assert!(diff_shallow_with(&old, &new, Equality::Structural).is_empty());
    }

    #[test]
    fn patch_round_trip() {
        let old = make_state(&[("a", json!(1)), ("b", json!({"c": 2})), ("d", json!(null))]);
        let new = old.with("a", 0).without("d").with("e", Value::array([1, 2]));

        let patched = patch_shallow(&old, &diff_shallow(&old, &new)).unwrap();
        assert_eq!(patched, new);
        assert!(patched.get("b").unwrap().is_identical(old.get("b").unwrap()));
        assert!(old.contains_key("d"));
    }

    #[test]
    fn patch_empty_returns_same_handle() {
        let old = make_state(&[("a", json!(1))]);
        assert!(patch_shallow(&old, &[]).unwrap().ptr_eq(&old));
    }

    #[test]
    fn patch_rejects_nested_records() {
        let old = make_state(&[("a", json!({"b": 1}))]);
        let err = patch_shallow(
            &old,
            &[ChangeRecord::KeysUpdated {
                key: "a".into(),
                changes: Vec::new(),
            }],
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "shallow patch cannot apply an `updated_keys` change at a"
        );
    }

    #[test]
    fn patch_shallow_value_requires_a_mapping() {
        assert!(patch_shallow_value(&Value::Null, &[]).is_err());
    }
}
