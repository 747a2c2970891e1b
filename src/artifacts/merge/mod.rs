//! Merge algorithms and conflict resolution
//!
//! - `bca_finder`: ancestry queries and merge-base selection
//! - `resolve`: structural three-way merge of trees
//! - `merge_result`: what a merge reports back
//! - `merge_state`: `MERGE_HEAD`/`MERGE_MSG` bookkeeping for a merge awaiting resolution

pub mod bca_finder;
pub mod merge_result;
pub mod merge_state;
pub mod resolve;
