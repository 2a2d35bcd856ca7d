//! Tree-level diff: compare two snapshots of a nested state.
//!
//! The differ walks every key of the new snapshot. Keys whose values are the
//! same (see [`Equality`]) are skipped without being visited, so the cost of a
//! diff is proportional to the parts of the tree that were actually rebuilt.
//! Changed mappings and sequences are described structurally, as nested
//! change lists and edit scripts, unless the [`Continuation`] says otherwise.

use serde::{Deserialize, Serialize};
use statepatch_types::{State, Value};
use tracing::trace;

use crate::array;
use crate::change::ChangeRecord;
use crate::continuation::{AlwaysContinue, Continuation};
use crate::error::DiffResult;

/// How the differ decides that two values need no change record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Equality {
    /// Primitives by value, containers by shared allocation.
    ///
    /// Suited to snapshots produced by a state container that rebuilds only
    /// the paths it modifies.
    #[default]
    Identity,
    /// Deep comparison. Suited to snapshots that were each deserialized
    /// independently, where no two containers share an allocation.
    Structural,
}

impl Equality {
    pub fn same(self, a: &Value, b: &Value) -> bool {
        match self {
            Equality::Identity => a.is_identical(b),
            Equality::Structural => a == b,
        }
    }
}

/// A configured tree differ.
///
/// ```
/// use statepatch_diff::{continuation::MaxDepth, TreeDiffer};
/// use statepatch_types::State;
///
/// let old: State = [("count", 1)].into_iter().collect();
/// let new = old.with("count", 2);
/// let changes = TreeDiffer::with_continuation(MaxDepth(1)).diff(&old, &new);
/// assert_eq!(changes.len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TreeDiffer<C = AlwaysContinue> {
    continuation: C,
    equality: Equality,
}

impl TreeDiffer<AlwaysContinue> {
    /// A differ that always recurses and compares by identity.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Continuation> TreeDiffer<C> {
    pub fn with_continuation(continuation: C) -> Self {
        Self {
            continuation,
            equality: Equality::default(),
        }
    }

    /// Set the equality mode.
    pub fn equality(mut self, equality: Equality) -> Self {
        self.equality = equality;
        self
    }

    pub fn equality_mode(&self) -> Equality {
        self.equality
    }

    /// Compute the change list turning `old` into `new`.
    ///
    /// Records for keys of `new` come first, in key order, followed by
    /// `Removed` records for keys only `old` has.
    pub fn diff(&mut self, old: &State, new: &State) -> Vec<ChangeRecord> {
        let mut path = Vec::new();
        self.diff_mappings(old, new, &mut path)
    }

    fn diff_mappings<'a>(
        &mut self,
        old: &'a State,
        new: &'a State,
        path: &mut Vec<&'a str>,
    ) -> Vec<ChangeRecord> {
        trace!(depth = path.len(), keys = new.len(), "diffing mapping");
        let mut changes = Vec::new();

        for (key, new_value) in new {
            let old_value = old.get(key);
            if old_value.is_some_and(|old_value| self.equality.same(old_value, new_value)) {
                continue;
            }
            path.push(key);
            changes.push(self.diff_entry(key, old_value, new_value, path));
            path.pop();
        }

        for key in old.keys() {
            if !new.contains_key(key) {
                changes.push(ChangeRecord::Removed { key: key.clone() });
            }
        }
        changes
    }

    fn diff_entry<'a>(
        &mut self,
        key: &str,
        old: Option<&'a Value>,
        new: &'a Value,
        path: &mut Vec<&'a str>,
    ) -> ChangeRecord {
        match (old, new) {
            (Some(old @ Value::Object(old_state)), Value::Object(new_state))
                if self.continuation.should_continue(old, new, path) =>
            {
                ChangeRecord::KeysUpdated {
                    key: key.to_owned(),
                    changes: self.diff_mappings(old_state, new_state, path),
                }
            }
            (Some(old @ Value::Array(old_items)), Value::Array(new_items))
                if self.continuation.should_continue(old, new, path) =>
            {
                trace!(
                    depth = path.len(),
                    old_len = old_items.len(),
                    new_len = new_items.len(),
                    "diffing sequence"
                );
                let equality = self.equality;
                ChangeRecord::ArrayUpdated {
                    key: key.to_owned(),
                    edits: array::get_patch_by(
                        old_items.as_slice(),
                        new_items.as_slice(),
                        |a, b| equality.same(a, b),
                    ),
                }
            }
            _ => ChangeRecord::Updated {
                key: key.to_owned(),
                value: new.clone(),
            },
        }
    }
}

/// Diff two states, recursing everywhere and comparing by identity.
pub fn diff_trees(old: &State, new: &State) -> Vec<ChangeRecord> {
    TreeDiffer::new().diff(old, new)
}

/// Diff two states under a continuation policy.
pub fn diff_trees_with<C: Continuation>(
    old: &State,
    new: &State,
    continuation: C,
) -> Vec<ChangeRecord> {
    TreeDiffer::with_continuation(continuation).diff(old, new)
}

/// Diff two values that must both be mappings.
pub fn diff_values(old: &Value, new: &Value) -> DiffResult<Vec<ChangeRecord>> {
    Ok(diff_trees(old.try_object()?, new.try_object()?))
}
