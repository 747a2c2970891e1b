//! Porcelain: the version-control workflow
//!
//! - `init`: create the repository directory
//! - `add`: stage and unstage paths
//! - `commit`: record the index as a commit
//! - `status`: compare HEAD, the index and the working tree
//! - `log`: walk the history
//! - `branch`: create, list and delete branches
//! - `checkout`: switch branches or detach HEAD
//! - `merge`: fast-forward or three-way merge, and abort a conflicted one

pub mod add;
pub mod branch;
pub mod checkout;
pub mod commit;
pub mod init;
pub mod log;
pub mod merge;
pub mod status;
