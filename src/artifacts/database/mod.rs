//! Entry types shared by trees and tree traversals
//!
//! A database entry is an object id tagged with the kind of object it names.

pub mod database_entry;
