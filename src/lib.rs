//! Arena-backed AVL tree collections for Rust.
//!
//! This crate provides [`AvlTreeMap`], an ordered map whose binary search tree rebalances
//! itself with AVL rotations after every insertion and removal, giving worst-case
//! O(log n) `insert`, `remove` and `get` regardless of the order keys arrive in.
//!
//! # Example
//!
//! ```
//! use avl_tree::AvlTreeMap;
//!
//! let mut scores = AvlTreeMap::new();
//! scores.insert("Alice", 100);
//! scores.insert("Bob", 85);
//! scores.insert("Carol", 92);
//!
//! assert_eq!(scores.get("Bob"), Some(&85));
//! assert_eq!(scores.len(), 3);
//!
//! // Overwriting a key returns the old value and leaves the tree's shape alone.
//! assert_eq!(scores.insert("Bob", 88), Some(85));
//!
//! // Removing an absent key is a no-op.
//! assert_eq!(scores.remove("Dave"), None);
//!
//! // Lookups that require the key report a `KeyError` instead.
//! assert!(scores.try_get("Dave").is_err());
//! ```
//!
//! The [`equal_paths`] module holds an unrelated helper that checks whether
//! every leaf of a plain binary tree sits at the same depth.
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Familiar API** - Mirrors the core of `std::collections::BTreeMap`
//! - **Index-linked nodes** - Parent and child links are arena handles, not pointers,
//!   so there is no `unsafe` and no reference cycles
//!
//! # Logging
//!
//! Structural changes are reported through the [`log`](https://docs.rs/log) facade:
//! insertions and removals at `debug`, rotations and imbalance cases at `trace`.
//! The crate never installs a logger itself.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod error;
mod raw;

pub mod avl_tree_map;
pub mod equal_paths;

pub use avl_tree_map::AvlTreeMap;
pub use error::KeyError;
