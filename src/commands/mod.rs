//! Operation surface of [`Repository`](crate::areas::repository::Repository)
//!
//! Every command is an inherent method added to `Repository` from its own file:
//!
//! - `plumbing`: building blocks working on objects, trees and the commit graph
//! - `porcelain`: user-facing workflows composed from them

pub mod plumbing;
pub mod porcelain;
