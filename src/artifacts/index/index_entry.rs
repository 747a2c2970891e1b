//! Index entry representation
//!
//! An entry maps a normalized, `/`-separated path to the blob staged for it. The only
//! metadata kept is a flag word; [`EntryFlags::CONFLICTED`] marks paths left unresolved by a
//! merge.

use crate::artifacts::objects::object::Packable;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::OBJECT_ID_BYTES;
use crate::errors::UgitError;
use anyhow::Context;
use bitflags::bitflags;
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Bytes preceding the path: flags, id, path length
pub const ENTRY_FIXED_SIZE: usize = 2 + OBJECT_ID_BYTES + 2;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EntryFlags: u16 {
        const CONFLICTED = 0b0000_0001;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct IndexEntry {
    /// Path relative to the working-tree root
    pub name: PathBuf,
    pub oid: ObjectId,
    pub flags: EntryFlags,
}

impl IndexEntry {
    pub fn clean(name: PathBuf, oid: ObjectId) -> Self {
        Self::new(name, oid, EntryFlags::empty())
    }

    pub fn conflicted(name: PathBuf, oid: ObjectId) -> Self {
        Self::new(name, oid, EntryFlags::CONFLICTED)
    }

    pub fn is_conflicted(&self) -> bool {
        self.flags.contains(EntryFlags::CONFLICTED)
    }

    pub fn basename(&self) -> anyhow::Result<&str> {
        self.name
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid file name"))
    }

    /// Every proper ancestor directory, outermost first (`a`, `a/b` for `a/b/c`)
    pub fn parent_dirs(&self) -> Vec<&Path> {
        let mut dirs = self
            .name
            .ancestors()
            .skip(1)
            .filter(|ancestor| !ancestor.as_os_str().is_empty())
            .collect::<Vec<_>>();
        dirs.reverse();

        dirs
    }

    /// Path with `/` separators, as stored on disk and in trees
    pub fn path_str(&self) -> anyhow::Result<String> {
        let components = self
            .name
            .components()
            .map(|component| {
                component
                    .as_os_str()
                    .to_str()
                    .with_context(|| format!("non UTF-8 path {}", self.name.display()))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(components.join("/"))
    }

    /// Decode one entry from the front of `bytes`, returning it and the bytes consumed
    pub fn deserialize_from(bytes: &[u8]) -> anyhow::Result<(Self, usize)> {
        if bytes.len() < ENTRY_FIXED_SIZE {
            return Err(UgitError::corrupt("index", "truncated entry").into());
        }

        let flags =
            EntryFlags::from_bits_truncate(byteorder::NetworkEndian::read_u16(&bytes[0..2]));
        let mut oid_bytes = &bytes[2..2 + OBJECT_ID_BYTES];
        let oid = ObjectId::read_binary_from(&mut oid_bytes)?;
        let path_len =
            byteorder::NetworkEndian::read_u16(&bytes[ENTRY_FIXED_SIZE - 2..ENTRY_FIXED_SIZE])
                as usize;

        let end = ENTRY_FIXED_SIZE + path_len;
        if bytes.len() < end {
            return Err(UgitError::corrupt("index", "truncated entry path").into());
        }
        let name = std::str::from_utf8(&bytes[ENTRY_FIXED_SIZE..end])
            .map_err(|_| UgitError::corrupt("index", "entry path is not valid UTF-8"))?;

        Ok((Self::new(PathBuf::from(name), oid, flags), end))
    }
}

impl Packable for IndexEntry {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let path = self.path_str()?;
        let path_len = u16::try_from(path.len())
            .map_err(|_| UgitError::invalid_path(&self.name, "path too long for the index"))?;

        let mut entry_bytes = Vec::with_capacity(ENTRY_FIXED_SIZE + path.len());
        entry_bytes.write_u16::<byteorder::NetworkEndian>(self.flags.bits())?;
        self.oid.write_binary_to(&mut entry_bytes)?;
        entry_bytes.write_u16::<byteorder::NetworkEndian>(path_len)?;
        entry_bytes.write_all(path.as_bytes())?;

        Ok(Bytes::from(entry_bytes))
    }
}
