//! Conversion between flat path tables and nested tree objects
//!
//! - `builder`: folds a sorted `path -> blob id` table into tree objects, deepest directory first
//! - `walker`: flattens a stored tree back into a `path -> blob id` table with an explicit stack

pub mod builder;
pub mod walker;

use crate::artifacts::objects::object_id::ObjectId;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Every file of a snapshot, keyed by its path relative to the snapshot root
pub type FlatTree = BTreeMap<PathBuf, ObjectId>;
