//! Working tree status inspection
//!
//! Status compares three snapshots: the HEAD commit's tree, the index, and the working tree.
//!
//! - `file_change`: change categories and their labels
//! - `inspector`: per-path comparisons
//! - `status_info`: the aggregated report

pub mod file_change;
pub mod inspector;
pub mod status_info;
