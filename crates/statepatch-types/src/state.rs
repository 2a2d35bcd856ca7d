//! Shared, immutable key-value mappings.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;
use crate::value::Value;

/// A mapping from string keys to [`Value`]s.
///
/// `State` is a handle: cloning it is an `Arc` clone, and two handles can be
/// tested for identity with [`State::ptr_eq`]. The mapping itself is never
/// mutated in place; "modifying" methods build a new mapping whose untouched
/// entries share storage with the original.
///
/// Keys iterate in sorted order, which makes every change list produced from a
/// pair of states deterministic.
#[derive(Clone, Default)]
pub struct State(Arc<BTreeMap<String, Value>>);

impl State {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an owned map.
    pub fn from_map(map: BTreeMap<String, Value>) -> Self {
        Self(Arc::new(map))
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.0
    }

    /// A shallow copy of the underlying map. Values are shared, not copied.
    pub fn to_map(&self) -> BTreeMap<String, Value> {
        self.0.as_ref().clone()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> btree_map::Keys<'_, String, Value> {
        self.0.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Returns `true` if both handles point at the same mapping.
    pub fn ptr_eq(&self, other: &State) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Follow a key path through nested mappings.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (last, parents) = path.split_last()?;
        let mut current = self;
        for key in parents {
            current = current.get(key)?.as_object()?;
        }
        current.get(last)
    }

    /// A new state with `key` set to `value`.
    pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> State {
        let mut map = self.to_map();
        map.insert(key.into(), value.into());
        State::from_map(map)
    }

    /// A new state without `key`.
    pub fn without(&self, key: &str) -> State {
        let mut map = self.to_map();
        map.remove(key);
        State::from_map(map)
    }
}

impl PartialEq for State {
    fn eq(&self, other: &State) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for State {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        State::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a State {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<BTreeMap<String, Value>> for State {
    fn from(map: BTreeMap<String, Value>) -> Self {
        State::from_map(map)
    }
}

impl TryFrom<Value> for State {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(state) => Ok(state),
            other => Err(TypeError::NotAMapping { found: other.kind() }),
        }
    }
}

impl TryFrom<serde_json::Value> for State {
    type Error = TypeError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        State::try_from(Value::from(value))
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for State {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<String, Value>::deserialize(deserializer).map(State::from_map)
    }
}
