//! Data structures and algorithms operating on the repository areas
//!
//! - `branch`: reference names and revision expressions
//! - `checkout`: working tree migrations and the local changes that block them
//! - `core`: pager plumbing for long output
//! - `database`: tree entries as stored in the object database
//! - `diff`: path-level difference between two flat trees
//! - `index`: on-disk layout of the staging area
//! - `log`: commit history traversal
//! - `merge`: merge bases, three-way tree merge and merge state
//! - `objects`: blob, tree and commit objects
//! - `status`: working tree status inspection
//! - `tree`: folding flat paths into nested trees and back

pub mod branch;
pub mod checkout;
pub mod core;
pub mod database;
pub mod diff;
pub mod index;
pub mod log;
pub mod merge;
pub mod objects;
pub mod status;
pub mod tree;
