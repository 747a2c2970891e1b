//! Commit history traversal
//!
//! - `rev_list`: lazy breadth-first walk over parent edges

pub mod rev_list;
