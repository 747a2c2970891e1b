//! Index file format
//!
//! ```text
//! Header (12 bytes):
//!   - Signature: "UIDX" (4 bytes)
//!   - Version: 1 (u32, network order)
//!   - Entry count (u32, network order)
//!
//! Entries, sorted by path:
//!   - Flags (u16)
//!   - Object id (20 bytes)
//!   - Path length (u16)
//!   - Path (UTF-8, `/`-separated)
//!
//! Checksum (20 bytes):
//!   - SHA-1 of all preceding bytes
//! ```

pub mod checksum;
pub mod index_entry;
pub mod index_header;

/// Size of SHA-1 checksum in bytes
pub const CHECKSUM_SIZE: usize = 20;

/// Size of index header in bytes
pub const HEADER_SIZE: usize = 12;

/// Magic signature identifying index files
pub const SIGNATURE: &str = "UIDX";

/// Index file format version
pub const VERSION: u32 = 1;
