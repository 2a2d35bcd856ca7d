//! Policies deciding how deep the tree differ recurses.
//!
//! When both sides of a changed key are mappings, or both are sequences, the
//! differ asks its [`Continuation`] whether to describe the change
//! structurally. Answering `false` makes the differ record the new value
//! wholesale as an `updated` change.

use std::collections::BTreeSet;

use statepatch_types::Value;

/// Decides whether the differ descends into a changed subtree.
///
/// `path` is the key path from the root to the subtree, its last segment
/// being the key under comparison. Any `FnMut(&Value, &Value, &[&str]) -> bool`
/// closure is a continuation.
pub trait Continuation {
    fn should_continue(&mut self, old: &Value, new: &Value, path: &[&str]) -> bool;

    /// Continue only when both `self` and `other` agree to.
    fn and<C: Continuation>(self, other: C) -> Both<Self, C>
    where
        Self: Sized,
    {
        Both(self, other)
    }
}

impl<F> Continuation for F
where
    F: FnMut(&Value, &Value, &[&str]) -> bool,
{
    fn should_continue(&mut self, old: &Value, new: &Value, path: &[&str]) -> bool {
        self(old, new, path)
    }
}

/// Always recurse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlwaysContinue;

impl Continuation for AlwaysContinue {
    fn should_continue(&mut self, _: &Value, _: &Value, _: &[&str]) -> bool {
        true
    }
}

/// Recurse while the path has at most `n` segments.
///
/// `MaxDepth(1)` describes changes to top-level keys structurally and
/// replaces anything deeper wholesale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaxDepth(pub usize);

impl Continuation for MaxDepth {
    fn should_continue(&mut self, _: &Value, _: &Value, path: &[&str]) -> bool {
        path.len() <= self.0
    }
}

/// Treat the listed paths as opaque values.
///
/// Paths are written dotted (`"session.token"`); a key containing a dot
/// cannot be named.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpaquePaths {
    paths: BTreeSet<Vec<String>>,
}

impl OpaquePaths {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            paths: paths
                .into_iter()
                .map(|p| p.as_ref().split('.').map(str::to_owned).collect())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn contains(&self, path: &[&str]) -> bool {
        if self.paths.is_empty() {
            return false;
        }
        let key: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        self.paths.contains(&key)
    }
}

impl Continuation for OpaquePaths {
    fn should_continue(&mut self, _: &Value, _: &Value, path: &[&str]) -> bool {
        !self.contains(path)
    }
}

/// Two continuations combined with [`Continuation::and`].
#[derive(Clone, Debug)]
pub struct Both<A, B>(A, B);

impl<A: Continuation, B: Continuation> Continuation for Both<A, B> {
    fn should_continue(&mut self, old: &Value, new: &Value, path: &[&str]) -> bool {
        self.0.should_continue(old, new, path) && self.1.should_continue(old, new, path)
    }
}

/// The continuation a configuration file can express: an optional depth cap
/// plus a set of opaque paths.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathPolicy {
    pub max_depth: Option<usize>,
    pub opaque: OpaquePaths,
}

impl PathPolicy {
    pub fn new(max_depth: Option<usize>, opaque: OpaquePaths) -> Self {
        Self { max_depth, opaque }
    }

    /// `true` when the policy never stops recursion.
    pub fn is_unbounded(&self) -> bool {
        self.max_depth.is_none() && self.opaque.is_empty()
    }
}

impl Continuation for PathPolicy {
    fn should_continue(&mut self, old: &Value, new: &Value, path: &[&str]) -> bool {
        let within_depth = self.max_depth.map_or(true, |n| path.len() <= n);
        within_depth && self.opaque.should_continue(old, new, path)
    }
}
