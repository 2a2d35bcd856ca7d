//! Diff strategies: how a publisher describes a state change and how a
//! replica applies it.
//!
//! Both ends of a link must use the same kind of strategy. A deep change list
//! handed to a shallow strategy fails with `UnsupportedChange` instead of
//! being half applied.

use std::fmt;

use serde::{Deserialize, Serialize};
use statepatch_diff::{
    patch_shallow, patch_tree, AlwaysContinue, ChangeRecord, Continuation, DiffResult, Equality,
    TreeDiffer,
};
use statepatch_types::State;

/// Named strategy kinds, as used in configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Recursive tree diff with array edit scripts.
    #[default]
    Deep,
    /// Top-level keys only.
    Shallow,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Deep => f.write_str("deep"),
            StrategyKind::Shallow => f.write_str("shallow"),
        }
    }
}

/// A matched diff/patch pair.
pub trait SyncStrategy {
    fn kind(&self) -> StrategyKind;

    /// Describe the change from `old` to `new`.
    fn diff(&mut self, old: &State, new: &State) -> Vec<ChangeRecord>;

    /// Rebuild the new state from `old` and a change list this strategy produced.
    fn patch(&self, old: &State, changes: &[ChangeRecord]) -> DiffResult<State>;
}

impl<S: SyncStrategy + ?Sized> SyncStrategy for Box<S> {
    fn kind(&self) -> StrategyKind {
        (**self).kind()
    }

    fn diff(&mut self, old: &State, new: &State) -> Vec<ChangeRecord> {
        (**self).diff(old, new)
    }

    fn patch(&self, old: &State, changes: &[ChangeRecord]) -> DiffResult<State> {
        (**self).patch(old, changes)
    }
}

/// A strategy chosen at runtime, e.g. from configuration.
pub type BoxedStrategy = Box<dyn SyncStrategy + Send>;

/// Tree diff driven by a continuation policy.
#[derive(Clone, Debug, Default)]
pub struct DeepStrategy<C = AlwaysContinue> {
    differ: TreeDiffer<C>,
}

impl DeepStrategy<AlwaysContinue> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Continuation> DeepStrategy<C> {
    pub fn with_continuation(continuation: C) -> Self {
        Self {
            differ: TreeDiffer::with_continuation(continuation),
        }
    }

    pub fn equality(self, equality: Equality) -> Self {
        Self {
            differ: self.differ.equality(equality),
        }
    }
}

impl<C: Continuation> SyncStrategy for DeepStrategy<C> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Deep
    }

    fn diff(&mut self, old: &State, new: &State) -> Vec<ChangeRecord> {
        self.differ.diff(old, new)
    }

    fn patch(&self, old: &State, changes: &[ChangeRecord]) -> DiffResult<State> {
        patch_tree(old, changes)
    }
}

/// Top-level diff: every changed key is sent whole.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShallowStrategy {
    equality: Equality,
}

impl ShallowStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equality(self, equality: Equality) -> Self {
        Self { equality }
    }
}

impl SyncStrategy for ShallowStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Shallow
    }

    fn diff(&mut self, old: &State, new: &State) -> Vec<ChangeRecord> {
        statepatch_diff::diff_shallow_with(old, new, self.equality)
    }

    fn patch(&self, old: &State, changes: &[ChangeRecord]) -> DiffResult<State> {
        patch_shallow(old, changes)
    }
}
