//! Plumbing: direct access to objects, trees and the commit graph
//!
//! - `hash-object`: hash a working-tree file as a blob, optionally storing it
//! - `cat-file`: print a stored object
//! - `write-tree` / `build_tree`: fold the index or a directory into tree objects
//! - `read-tree` / `restore_tree`: load a tree into the index or onto the working tree
//! - `ls-tree`: list the entries of a tree
//! - `commit-tree`: create a commit object from a tree and parents
//! - `merge-base`: best common ancestor, ancestry checks

pub mod cat_file;
pub mod commit_tree;
pub mod hash_object;
pub mod ls_tree;
pub mod merge_base;
pub mod read_tree;
pub mod write_tree;
