//! Checkout operations and conflict handling
//!
//! Moving the working tree from one snapshot to another:
//! - the difference between the current and target flat trees is planned first
//! - local modifications the plan would clobber are reported before anything is touched
//! - the working tree and the index are then updated together
//!
//! Merges reuse the same machinery to move from `ours` to the merged result.

pub mod conflict;
pub mod migration;
