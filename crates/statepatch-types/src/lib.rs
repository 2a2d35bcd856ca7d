//! Foundation types for statepatch.
//!
//! This crate provides the value tree that replicas keep in sync. Every other
//! statepatch crate depends on `statepatch-types`.
//!
//! # Key Types
//!
//! - [`Value`] -- A node of the state tree: primitive, sequence, or mapping
//! - [`State`] -- A shared, immutable mapping from string keys to values
//! - [`TypeError`] -- Shape mismatches (a mapping or sequence was expected)
//!
//! Containers are reference counted. Cloning a [`Value`] or [`State`] shares
//! the underlying storage, which is what lets the differ skip unchanged
//! subtrees by identity and lets the patcher reuse them untouched.

pub mod error;
pub mod state;
pub mod value;

pub use error::TypeError;
pub use state::State;
pub use value::Value;
