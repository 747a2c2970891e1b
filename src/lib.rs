//! ugit: a minimal content-addressable version control engine
//!
//! The crate is organised the same way the on-disk repository is:
//!
//! - `areas`: the stateful parts of a repository (object database, refs, index, workspace)
//! - `artifacts`: the data structures and algorithms operating on them
//! - `commands`: the operation surface exposed on [`areas::repository::Repository`]
//! - `errors`: the tagged failure taxonomy surfaced by every operation

pub mod areas;
pub mod artifacts;
pub mod commands;
pub mod errors;

/// Name of the directory holding the repository data inside the working tree
pub const REPOSITORY_DIR: &str = ".ugit";

/// Branch HEAD points to right after `init`
pub const DEFAULT_BRANCH: &str = "main";
