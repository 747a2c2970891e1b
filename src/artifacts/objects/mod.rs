//! Stored object kinds
//!
//! Everything ugit records is an immutable object identified by the SHA-1 digest of its
//! framed bytes: `<type> <decimal length>\0<payload>`. Objects are stored uncompressed.
//!
//! - **Blob**: raw file bytes
//! - **Tree**: sorted `name -> (kind, id)` listing of one directory
//! - **Commit**: a tree id, ordered parent ids, an author name and a message

pub mod blob;
pub mod commit;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

/// Length of an object id in hexadecimal form
pub const OBJECT_ID_LENGTH: usize = 40;

/// Length of an object id in binary form (inside trees and the index)
pub const OBJECT_ID_BYTES: usize = 20;
