//! Diff engine for statepatch.
//!
//! Computes compact change lists between two snapshots of a state tree and
//! rebuilds the new snapshot from the old one plus a change list.
//!
//! # Key Types
//!
//! - [`ChangeRecord`] -- How one key changed (updated, removed, nested keys, array edits)
//! - [`EditOp`] -- One add/remove run of a minimal array edit script
//! - [`TreeDiffer`] -- Recursive differ configured with a [`Continuation`] and [`Equality`]
//! - [`DiffError`] -- A change list that does not fit the state it is applied to
//!
//! # Example
//!
//! ```
//! use statepatch_diff::{diff_trees, patch_tree};
//! use statepatch_types::{State, Value};
//!
//! let old: State = [("todos", Value::array(["write docs"]))].into_iter().collect();
//! let new = old.with("todos", Value::array(["write docs", "ship"]));
//!
//! let changes = diff_trees(&old, &new);
//! assert_eq!(patch_tree(&old, &changes).unwrap(), new);
//! ```

pub mod array;
pub mod change;
pub mod continuation;
pub mod error;
pub mod state_diff;
pub mod tree_diff;
pub mod tree_patch;

pub use array::{apply_patch, get_patch, ArrayDiff, EditOp, RemovedSpan};
pub use change::{ChangeRecord, ChangeStats};
pub use continuation::{AlwaysContinue, Continuation, MaxDepth, OpaquePaths, PathPolicy};
pub use error::{DiffError, DiffResult, KeyPath};
pub use state_diff::{diff_shallow, diff_shallow_with, patch_shallow};
pub use tree_diff::{diff_trees, diff_trees_with, diff_values, Equality, TreeDiffer};
pub use tree_patch::{patch_tree, patch_value};
