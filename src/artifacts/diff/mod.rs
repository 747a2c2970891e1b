//! Snapshot comparison
//!
//! `tree_diff` compares two flattened snapshots path by path.

pub mod tree_diff;
