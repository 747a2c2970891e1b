//! Stateful parts of a repository
//!
//! - `database`: content-addressed object store under `.ugit/objects`
//! - `index`: staging area persisted in `.ugit/index`
//! - `refs`: HEAD, branches and tags
//! - `repository`: handle tying the other areas to one working tree
//! - `workspace`: the working tree on disk

pub mod database;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
