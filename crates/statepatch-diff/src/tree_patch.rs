//! Apply a change list to a state snapshot.

use statepatch_types::{State, Value};
use tracing::trace;

use crate::array;
use crate::change::ChangeRecord;
use crate::error::{DiffError, DiffResult, KeyPath};

/// Rebuild the snapshot a change list was computed for.
///
/// `old` is never modified. The result shares every value the change list
/// does not touch with `old`, and an empty change list returns `old` itself.
///
/// Nested records must fit the value they target: `updated_keys` needs a
/// mapping, `updated_array` a sequence that its edit script fits.
pub fn patch_tree(old: &State, changes: &[ChangeRecord]) -> DiffResult<State> {
    let mut path = Vec::new();
    patch_mapping(old, changes, &mut path)
}

/// [`patch_tree`] for a value that must be a mapping.
pub fn patch_value(old: &Value, changes: &[ChangeRecord]) -> DiffResult<Value> {
    patch_tree(old.try_object()?, changes).map(Value::Object)
}

fn patch_mapping<'a>(
    old: &State,
    changes: &'a [ChangeRecord],
    path: &mut Vec<&'a str>,
) -> DiffResult<State> {
    if changes.is_empty() {
        return Ok(old.clone());
    }
    trace!(depth = path.len(), changes = changes.len(), "patching mapping");

    let mut map = old.to_map();
    for change in changes {
        match change {
            ChangeRecord::Updated { key, value } => {
                map.insert(key.clone(), value.clone());
            }
            ChangeRecord::Removed { key } => {
                map.remove(key);
            }
            ChangeRecord::KeysUpdated { key, changes } => {
                path.push(key);
                let patched = match map.get(key) {
                    Some(Value::Object(nested)) => patch_mapping(nested, changes, path)?,
                    other => {
                        return Err(DiffError::NotAMapping {
                            path: KeyPath::from(&path[..]),
                            found: other.map_or("nothing", Value::kind),
                        })
                    }
                };
                path.pop();
                map.insert(key.clone(), Value::Object(patched));
            }
            ChangeRecord::ArrayUpdated { key, edits } => {
                path.push(key);
                let patched = match map.get(key) {
                    Some(Value::Array(items)) if edits.is_empty() => Value::Array(items.clone()),
                    Some(Value::Array(items)) => array::apply_patch(items.as_slice(), edits)
                        .map(Value::from)
                        .map_err(|err| err.at(path))?,
                    other => {
                        return Err(DiffError::NotASequence {
                            path: KeyPath::from(&path[..]),
                            found: other.map_or("nothing", Value::kind),
                        })
                    }
                };
                path.pop();
                map.insert(key.clone(), patched);
            }
        }
    }
    Ok(State::from_map(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{EditOp, RemovedSpan};
    use crate::tree_diff::diff_trees;
    use serde_json::json;

    fn state(v: serde_json::Value) -> State {
        State::try_from(v).unwrap()
    }

    fn changes(v: serde_json::Value) -> Vec<ChangeRecord> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn empty_change_list_returns_same_handle() {
        let old = state(json!({"a": 1}));
        let new = patch_tree(&old, &[]).unwrap();
        assert!(new.ptr_eq(&old));
    }

    #[test]
    fn empty_nested_changes_keep_values_shared() {
        let old = state(json!({"a": {}, "b": {}}));
        let new = patch_tree(&old, &changes(json!([{"key": "a", "change": "updated_keys", "value": []}]))).unwrap();
        assert!(!new.ptr_eq(&old));
        assert!(new.get("a").unwrap().is_identical(old.get("a").unwrap()));
        assert!(new.get("b").unwrap().is_identical(old.get("b").unwrap()));
    }

    #[test]
    fn nested_updates_copy_only_the_touched_path() {
        let old = state(json!({"a": {"b": 1}, "c": {}}));
        let new = patch_tree(
            &old,
            &changes(json!([{"key": "a", "change": "updated_keys", "value": [
                {"key": "b", "change": "updated", "value": 2},
                {"key": "d", "change": "updated", "value": 3},
            ]}])),
        )
        .unwrap();
        assert_eq!(new, state(json!({"a": {"b": 2, "d": 3}, "c": {}})));
        assert!(!new.get("a").unwrap().is_identical(old.get("a").unwrap()));
        assert!(new.get("c").unwrap().is_identical(old.get("c").unwrap()));
    }

    #[test]
    fn removals_leave_the_original_intact() {
        let old = state(json!({"a": {"b": 1}, "c": {}}));
        let new = patch_tree(&old, &changes(json!([{"key": "c", "change": "removed"}]))).unwrap();
        assert!(!new.contains_key("c"));
        assert!(new.get("a").unwrap().is_identical(old.get("a").unwrap()));
        assert!(old.contains_key("c"));
    }

    #[test]
    fn array_append() {
        let old = state(json!({"a": [1]}));
        let new = patch_tree(
            &old,
            &changes(json!([{"key": "a", "change": "updated_array", "value": [
                {"type": "add", "oldPos": 1, "newPos": 1, "items": [2]}
            ]}])),
        )
        .unwrap();
        assert_eq!(new, state(json!({"a": [1, 2]})));
        assert_eq!(old, state(json!({"a": [1]})));
    }

    #[test]
    fn empty_edit_script_keeps_the_sequence() {
        let old = state(json!({"a": [1, 2]}));
        let new = patch_tree(
            &old,
            &[ChangeRecord::ArrayUpdated {
                key: "a".into(),
                edits: Vec::new(),
            }],
        )
        .unwrap();
        assert!(new.get("a").unwrap().is_identical(old.get("a").unwrap()));
    }

    #[test]
    fn scenario_nested_key_added() {
        let old = state(json!({"a": {"b": 1, "c": 2}}));
        let new = state(json!({"a": {"b": 1, "c": 2, "d": 3}}));
        let diff = diff_trees(&old, &new);
        assert_eq!(
            serde_json::to_value(&diff).unwrap(),
            json!([{"key": "a", "change": "updated_keys", "value": [
                {"key": "d", "change": "updated", "value": 3}
            ]}])
        );
        assert_eq!(patch_tree(&old, &diff).unwrap(), new);
        assert_eq!(old, state(json!({"a": {"b": 1, "c": 2}})));
    }

    #[test]
    fn round_trip_through_the_wire() {
        let old = state(json!({
            "todos": [{"id": 1, "done": false}, {"id": 2, "done": false}],
            "filter": "all",
            "user": {"name": "ada", "prefs": {"theme": "dark"}},
            "gone": true
        }));
        let new = state(json!({
            "todos": [{"id": 2, "done": true}, {"id": 3, "done": false}],
            "filter": "active",
            "user": {"name": "ada", "prefs": {"theme": "light", "font": 12}}
        }));
        let diff = diff_trees(&old, &new);
        let text = serde_json::to_string(&diff).unwrap();
        let decoded: Vec<ChangeRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(patch_tree(&old, &decoded).unwrap(), new);
    }

    #[test]
    fn array_update_with_negative_new_pos() {
        let old = state(json!({"letters": ["y", "y", "x", "x"]}));
        let wire = json!([{"key": "letters", "change": "updated_array", "value": [
            {"type": "remove", "oldPos": 0, "newPos": -1, "items": ["y", "y", "x"]},
            {"type": "add", "oldPos": 3, "newPos": 0, "items": ["z"]}
        ]}]);
        let decoded = changes(wire.clone());
        assert_eq!(
            patch_tree(&old, &decoded).unwrap(),
            state(json!({"letters": ["z", "x"]}))
        );
        assert_eq!(
            serde_json::to_value(diff_trees(&old, &state(json!({"letters": ["z", "x"]})))).unwrap(),
            wire
        );
    }

    #[test]
    fn keys_updated_on_missing_key_fails() {
        let old = state(json!({"a": {"b": 1}}));
        let err = patch_tree(
            &old,
            &changes(json!([{"key": "a", "change": "updated_keys", "value": [
                {"key": "x", "change": "updated_keys", "value": []}
            ]}])),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DiffError::NotAMapping {
                path: KeyPath::from(&["a", "x"][..]),
                found: "nothing",
            }
        );
        assert_eq!(err.to_string(), "expected a mapping at a.x, found nothing");
    }

    #[test]
    fn array_update_on_mapping_fails() {
        let old = state(json!({"a": {"b": 1}}));
        let err = patch_tree(
            &old,
            &changes(json!([{"key": "a", "change": "updated_array", "value": []}])),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DiffError::NotASequence {
                path: KeyPath::from(&["a"][..]),
                found: "object",
            }
        );
    }

    #[test]
    fn bad_edit_script_reports_its_path() {
        let old = state(json!({"list": [1, 2]}));
        let err = patch_tree(
            &old,
            &[ChangeRecord::ArrayUpdated {
                key: "list".into(),
                edits: vec![EditOp::Remove {
                    old_pos: 1,
                    new_pos: 1,
                    span: RemovedSpan::Length(5),
                }],
            }],
        )
        .unwrap_err();
        assert_eq!(
            err,
            DiffError::EditOutOfRange {
                path: KeyPath::from(&["list"][..]),
                index: 0,
                old_pos: 1,
                span: 5,
                len: 2,
            }
        );
    }

    #[test]
    fn patch_value_requires_a_mapping() {
        assert!(patch_value(&Value::from(1), &[]).is_err());
        let patched = patch_value(
            &Value::object([("a", 1)]),
            &changes(json!([{"key": "a", "change": "updated", "value": 2}])),
        )
        .unwrap();
        assert_eq!(patched, Value::object([("a", 2)]));
    }

    // ---- properties ----

    mod properties {
        use super::*;
        use crate::tree_diff::{Equality, TreeDiffer};
        use proptest::prelude::*;

        fn leaf() -> impl Strategy<Value = Value> {
            prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::from),
                (-3i32..3).prop_map(Value::from),
                "[xy]{0,2}".prop_map(Value::from),
            ]
        }

        fn value() -> impl Strategy<Value = Value> {
            leaf().prop_recursive(3, 32, 4, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
                    prop::collection::btree_map("[a-d]", inner, 0..4)
                        .prop_map(|map| Value::Object(State::from_map(map))),
                ]
            })
        }

        fn tree() -> impl Strategy<Value = State> {
            prop::collection::btree_map("[a-e]", value(), 0..5).prop_map(State::from_map)
        }

        fn equality() -> impl Strategy<Value = Equality> {
            prop_oneof![Just(Equality::Identity), Just(Equality::Structural)]
        }

        proptest! {
            #[test]
            fn prop_patch_rebuilds_new(old in tree(), new in tree(), eq in equality()) {
                let before = serde_json::to_value(&old).unwrap();
                let changes = TreeDiffer::new().equality(eq).diff(&old, &new);
                prop_assert_eq!(patch_tree(&old, &changes).unwrap(), new.clone());
                prop_assert_eq!(serde_json::to_value(&old).unwrap(), before);
            }

            #[test]
            fn prop_patch_rebuilds_derived_state(
                old in tree(),
                key in "[a-e]",
                replacement in value(),
                gone in "[a-e]",
                eq in equality(),
            ) {
                let new = old.with(key, replacement).without(&gone);
                let changes = TreeDiffer::new().equality(eq).diff(&old, &new);
                let patched = patch_tree(&old, &changes).unwrap();
                prop_assert_eq!(&patched, &new);
                for (key, value) in &patched {
                    if let Some(original) = old.get(key) {
                        if original.is_identical(new.get(key).unwrap()) {
                            prop_assert!(value.is_identical(original));
                        }
                    }
                }
            }

            #[test]
            fn prop_patch_survives_the_wire(old in tree(), new in tree(), eq in equality()) {
                let changes = TreeDiffer::new().equality(eq).diff(&old, &new);
                let text = serde_json::to_string(&changes).unwrap();
                let decoded: Vec<ChangeRecord> = serde_json::from_str(&text).unwrap();
                prop_assert_eq!(patch_tree(&old, &decoded).unwrap(), new);
            }

            #[test]
            fn prop_diff_of_self_is_empty(old in tree(), eq in equality()) {
                prop_assert!(TreeDiffer::new().equality(eq).diff(&old, &old).is_empty());
            }
        }
    }
}
