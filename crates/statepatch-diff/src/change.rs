//! Change records: how one key changed between two snapshots of a state.

use serde::{Deserialize, Serialize};
use statepatch_types::Value;

use crate::array::EditOp;

/// Literal wire tags for change kinds and edit op kinds.
pub mod tags {
    pub const UPDATED: &str = "updated";
    pub const REMOVED: &str = "removed";
    pub const KEYS_UPDATED: &str = "updated_keys";
    pub const ARRAY_UPDATED: &str = "updated_array";
    pub const ADD: &str = "add";
    pub const REMOVE: &str = "remove";
}

/// The change recorded for a single key of a mapping.
///
/// A change list holds at most one record per key. Records serialize as
/// `{"key": .., "change": <tag>, "value": ..}`; `Removed` has no value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change")]
pub enum ChangeRecord {
    /// The key was added, or its value replaced wholesale.
    #[serde(rename = "updated")]
    Updated { key: String, value: Value },

    /// The key is gone from the new snapshot.
    #[serde(rename = "removed")]
    Removed { key: String },

    /// Both sides are mappings; `changes` patches the nested mapping.
    #[serde(rename = "updated_keys")]
    KeysUpdated {
        key: String,
        #[serde(rename = "value")]
        changes: Vec<ChangeRecord>,
    },

    /// Both sides are sequences; `edits` patches the nested sequence.
    #[serde(rename = "updated_array")]
    ArrayUpdated {
        key: String,
        #[serde(rename = "value")]
        edits: Vec<EditOp<Value>>,
    },
}

impl ChangeRecord {
    pub fn key(&self) -> &str {
        match self {
            ChangeRecord::Updated { key, .. }
            | ChangeRecord::Removed { key }
            | ChangeRecord::KeysUpdated { key, .. }
            | ChangeRecord::ArrayUpdated { key, .. } => key,
        }
    }

    /// The wire tag of this record.
    pub fn tag(&self) -> &'static str {
        match self {
            ChangeRecord::Updated { .. } => tags::UPDATED,
            ChangeRecord::Removed { .. } => tags::REMOVED,
            ChangeRecord::KeysUpdated { .. } => tags::KEYS_UPDATED,
            ChangeRecord::ArrayUpdated { .. } => tags::ARRAY_UPDATED,
        }
    }
}

/// Counts over a change list, nested records included.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeStats {
    pub updated: usize,
    pub removed: usize,
    pub keys_updated: usize,
    pub arrays_updated: usize,
    /// Total edit ops across every `ArrayUpdated` record.
    pub edit_ops: usize,
}

impl ChangeStats {
    pub fn of(changes: &[ChangeRecord]) -> Self {
        let mut stats = Self::default();
        stats.count(changes);
        stats
    }

    fn count(&mut self, changes: &[ChangeRecord]) {
        for change in changes {
            match change {
                ChangeRecord::Updated { .. } => self.updated += 1,
                ChangeRecord::Removed { .. } => self.removed += 1,
                ChangeRecord::KeysUpdated { changes, .. } => {
                    self.keys_updated += 1;
                    self.count(changes);
                }
                ChangeRecord::ArrayUpdated { edits, .. } => {
                    self.arrays_updated += 1;
                    self.edit_ops += edits.len();
                }
            }
        }
    }

    /// Number of records, nested ones included.
    pub fn records(&self) -> usize {
        self.updated + self.removed + self.keys_updated + self.arrays_updated
    }
}
