//! Minimal edit scripts between ordered sequences.
//!
//! [`get_patch`] computes a shortest run-length script of [`EditOp`]s turning
//! one slice into another, and [`apply_patch`] replays it. [`diff`] and
//! [`same`] expose the same walk as an unordered added/removed view and as
//! the longest common subsequence.
//!
//! Every function has a `_by` form taking an equality predicate, so tree
//! values can be matched by identity instead of by content.

mod lcs;

use std::ops::Range;

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::error::{DiffError, DiffResult, KeyPath};
use lcs::RunKind;

/// Elements added to and removed from a sequence, without positions.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayDiff<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
}

/// What a [`EditOp::Remove`] carries about the removed run.
#[derive(Clone, Debug, PartialEq)]
pub enum RemovedSpan<T> {
    /// The removed elements themselves.
    Items(Vec<T>),
    /// Only how many elements were removed.
    Length(usize),
}

impl<T> RemovedSpan<T> {
    pub fn len(&self) -> usize {
        match self {
            RemovedSpan::Items(items) => items.len(),
            RemovedSpan::Length(len) => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One run of an edit script.
///
/// `old_pos` indexes the source sequence and `new_pos` the target sequence.
/// `new_pos` is informational and can be negative for a removal that the
/// builder moved ahead of an addition; replaying a script never reads it.
/// Scripts are ordered by ascending `old_pos`; an `Add` that shares its
/// `old_pos` with a `Remove` follows it.
#[derive(Clone, Debug, PartialEq)]
pub enum EditOp<T> {
    /// Insert `items` before source position `old_pos`.
    Add {
        old_pos: usize,
        new_pos: isize,
        items: Vec<T>,
    },
    /// Drop a run of the source starting at `old_pos`.
    Remove {
        old_pos: usize,
        new_pos: isize,
        span: RemovedSpan<T>,
    },
}

impl<T> EditOp<T> {
    pub fn old_pos(&self) -> usize {
        match self {
            EditOp::Add { old_pos, .. } | EditOp::Remove { old_pos, .. } => *old_pos,
        }
    }

    pub fn new_pos(&self) -> isize {
        match self {
            EditOp::Add { new_pos, .. } | EditOp::Remove { new_pos, .. } => *new_pos,
        }
    }

    /// Number of elements the op adds or removes.
    pub fn len(&self) -> usize {
        match self {
            EditOp::Add { items, .. } => items.len(),
            EditOp::Remove { span, .. } => span.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The wire tag of this op.
    pub fn tag(&self) -> &'static str {
        match self {
            EditOp::Add { .. } => crate::change::tags::ADD,
            EditOp::Remove { .. } => crate::change::tags::REMOVE,
        }
    }

    /// Drop the removed elements from a `Remove`, keeping only its length.
    pub fn compact(self) -> Self {
        match self {
            EditOp::Remove {
                old_pos,
                new_pos,
                span,
            } => EditOp::Remove {
                old_pos,
                new_pos,
                span: RemovedSpan::Length(span.len()),
            },
            add => add,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
enum EditKind {
    Add,
    Remove,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct WireEditOpRef<'a, T> {
    #[serde(rename = "type")]
    kind: EditKind,
    old_pos: usize,
    new_pos: isize,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<&'a [T]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    length: Option<usize>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEditOp<T> {
    #[serde(rename = "type")]
    kind: EditKind,
    old_pos: usize,
    new_pos: isize,
    items: Option<Vec<T>>,
    length: Option<usize>,
}

impl<T: Serialize> Serialize for EditOp<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            EditOp::Add {
                old_pos,
                new_pos,
                items,
            } => WireEditOpRef {
                kind: EditKind::Add,
                old_pos: *old_pos,
                new_pos: *new_pos,
                items: Some(items.as_slice()),
                length: None,
            },
            EditOp::Remove {
                old_pos,
                new_pos,
                span,
            } => {
                let (items, length) = match span {
                    RemovedSpan::Items(items) => (Some(items.as_slice()), None),
                    RemovedSpan::Length(len) => (None, Some(*len)),
                };
                WireEditOpRef {
                    kind: EditKind::Remove,
                    old_pos: *old_pos,
                    new_pos: *new_pos,
                    items,
                    length,
                }
            }
        };
        wire.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for EditOp<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireEditOp::<T>::deserialize(deserializer)?;
        let (old_pos, new_pos) = (wire.old_pos, wire.new_pos);
        match (wire.kind, wire.items, wire.length) {
            (EditKind::Add, Some(items), _) => Ok(EditOp::Add {
                old_pos,
                new_pos,
                items,
            }),
            (EditKind::Add, None, _) => Err(de::Error::missing_field("items")),
            (EditKind::Remove, Some(items), _) => Ok(EditOp::Remove {
                old_pos,
                new_pos,
                span: RemovedSpan::Items(items),
            }),
            (EditKind::Remove, None, Some(len)) => Ok(EditOp::Remove {
                old_pos,
                new_pos,
                span: RemovedSpan::Length(len),
            }),
            (EditKind::Remove, None, None) => Err(de::Error::custom(
                "remove op needs either `items` or `length`",
            )),
        }
    }
}

/// Elements added and removed between `a` and `b`.
pub fn diff<T: PartialEq + Clone>(a: &[T], b: &[T]) -> ArrayDiff<T> {
    diff_by(a, b, |x, y| x == y)
}

pub fn diff_by<T, F>(a: &[T], b: &[T], compare: F) -> ArrayDiff<T>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    let mut result = ArrayDiff {
        added: Vec::new(),
        removed: Vec::new(),
    };
    lcs::best_subsequence(a, b, &compare, |kind, old, new| match kind {
        RunKind::Add => result.added.extend_from_slice(&b[new]),
        RunKind::Remove => result.removed.extend_from_slice(&a[old]),
        RunKind::Same => {}
    });
    result
}

/// Longest common subsequence of `a` and `b`.
pub fn same<T: PartialEq + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    same_by(a, b, |x, y| x == y)
}

/// Longest common subsequence under `compare`; elements are taken from `a`.
pub fn same_by<T, F>(a: &[T], b: &[T], compare: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    let mut common = Vec::new();
    lcs::best_subsequence(a, b, &compare, |kind, old, _| {
        if kind == RunKind::Same {
            common.extend_from_slice(&a[old]);
        }
    });
    common
}

/// Minimal edit script turning `a` into `b`.
pub fn get_patch<T: PartialEq + Clone>(a: &[T], b: &[T]) -> Vec<EditOp<T>> {
    get_patch_by(a, b, |x, y| x == y)
}

pub fn get_patch_by<T, F>(a: &[T], b: &[T], compare: F) -> Vec<EditOp<T>>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    let mut builder = ScriptBuilder::new(a, b);
    lcs::best_subsequence(a, b, &compare, |kind, old, new| builder.push(kind, old, new));
    builder.finish()
}

/// A run being accumulated before it is appended to the script.
struct PendingRun<T> {
    old_pos: usize,
    new_pos: isize,
    items: Vec<T>,
}

/// Folds the runs of an edit path into a script, merging adjacent removals
/// and additions between two unchanged runs into at most one of each.
struct ScriptBuilder<'a, T> {
    a: &'a [T],
    b: &'a [T],
    script: Vec<EditOp<T>>,
    remove: Option<PendingRun<T>>,
    add: Option<PendingRun<T>>,
}

impl<'a, T: Clone> ScriptBuilder<'a, T> {
    fn new(a: &'a [T], b: &'a [T]) -> Self {
        Self {
            a,
            b,
            script: Vec::new(),
            remove: None,
            add: None,
        }
    }

    fn push(&mut self, kind: RunKind, old: Range<usize>, new: Range<usize>) {
        match kind {
            RunKind::Same => self.flush(),
            RunKind::Remove => {
                let removed = old.len();
                let remove = self.remove.get_or_insert_with(|| PendingRun {
                    old_pos: old.start,
                    new_pos: new.start as isize,
                    items: Vec::new(),
                });
                remove.items.extend_from_slice(&self.a[old.clone()]);
                if let Some(add) = self.add.as_mut() {
                    // The removal now precedes the pending addition.
                    add.old_pos += removed;
                    if remove.old_pos == old.start {
                        remove.new_pos -= removed as isize;
                    }
                }
            }
            RunKind::Add => {
                let add = self.add.get_or_insert_with(|| PendingRun {
                    old_pos: old.start,
                    new_pos: new.start as isize,
                    items: Vec::new(),
                });
                add.items.extend_from_slice(&self.b[new]);
            }
        }
    }

    fn flush(&mut self) {
        if let Some(run) = self.remove.take() {
            self.script.push(EditOp::Remove {
                old_pos: run.old_pos,
                new_pos: run.new_pos,
                span: RemovedSpan::Items(run.items),
            });
        }
        if let Some(run) = self.add.take() {
            self.script.push(EditOp::Add {
                old_pos: run.old_pos,
                new_pos: run.new_pos,
                items: run.items,
            });
        }
    }

    fn finish(mut self) -> Vec<EditOp<T>> {
        self.flush();
        self.script
    }
}

/// Replay an edit script against `a`, building a new sequence.
///
/// Ops must be in ascending `old_pos` order and lie within `a`; anything
/// else fails with [`DiffError::EditOutOfRange`] anchored at the root.
pub fn apply_patch<T: Clone>(a: &[T], ops: &[EditOp<T>]) -> DiffResult<Vec<T>> {
    let mut out = Vec::with_capacity(a.len());
    let mut cursor = 0;

    for (index, op) in ops.iter().enumerate() {
        let old_pos = op.old_pos();
        let span = match op {
            EditOp::Add { .. } => 0,
            EditOp::Remove { span, .. } => span.len(),
        };
        let end = old_pos.checked_add(span).filter(|end| *end <= a.len());
        let end = match end {
            Some(end) if old_pos >= cursor => end,
            _ => {
                return Err(DiffError::EditOutOfRange {
                    path: KeyPath::root(),
                    index,
                    old_pos,
                    span,
                    len: a.len(),
                })
            }
        };

        out.extend_from_slice(&a[cursor..old_pos]);
        match op {
            EditOp::Add { items, .. } => {
                out.extend_from_slice(items);
                cursor = old_pos;
            }
            EditOp::Remove { .. } => cursor = end,
        }
    }
    out.extend_from_slice(&a[cursor..]);
    Ok(out)
}
