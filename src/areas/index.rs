//! Staging area
//!
//! The index is an ordered `path -> blob id` table sitting between the working tree and the
//! next commit. It is persisted in `.ugit/index` (see [`crate::artifacts::index`] for the
//! format) and guarded by two kinds of locks:
//!
//! - the index file itself is read under a shared lock and rewritten under an exclusive one
//! - whole read-modify-write operations hold an [`IndexLock`] on `.ugit/index.lock`
//!
//! ## Data Structures
//!
//! - `entries`: Maps file paths to their index entries
//! - `children`: Maps directory paths to the tracked files below them

use crate::artifacts::index::checksum::Checksum;
use crate::artifacts::index::index_entry::{ENTRY_FIXED_SIZE, IndexEntry};
use crate::artifacts::index::index_header::IndexHeader;
use crate::artifacts::index::{HEADER_SIZE, SIGNATURE, VERSION};
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::UgitError;
use anyhow::Context;
use byteorder::ByteOrder;
use file_guard::{FileGuard, Lock};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Advisory lock held for the duration of an index read-modify-write cycle
#[derive(Debug)]
pub struct IndexLock {
    _guard: FileGuard<Box<File>>,
}

impl IndexLock {
    pub fn acquire(lock_path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .with_context(|| format!("failed to open {}", lock_path.display()))?;
        let guard = file_guard::lock(Box::new(file), Lock::Exclusive, 0, 1)
            .with_context(|| format!("failed to lock {}", lock_path.display()))?;

        Ok(IndexLock { _guard: guard })
    }
}

#[derive(Debug, Clone)]
pub struct Index {
    /// Path to the index file (`.ugit/index`)
    path: Box<Path>,
    entries: BTreeMap<PathBuf, IndexEntry>,
    children: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    header: IndexHeader,
    /// Set when the in-memory entries diverge from the file
    changed: bool,
}

impl Index {
    pub fn new(path: Box<Path>) -> Self {
        Index {
            path,
            entries: BTreeMap::new(),
            children: BTreeMap::new(),
            header: IndexHeader::empty(),
            changed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn entry_by_path(&self, path: &Path) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.children.clear();
        self.header = IndexHeader::empty();
        self.changed = true;
    }

    /// Reload the entries from disk, verifying the trailing checksum
    ///
    /// A missing or empty file is an empty index.
    pub fn rehydrate(&mut self) -> anyhow::Result<()> {
        self.clear();
        self.changed = false;

        if !self.path.exists() {
            return Ok(());
        }

        let index_file = std::fs::OpenOptions::new()
            .read(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let _lock = file_guard::lock(&index_file, Lock::Shared, 0, 1)?;

        if index_file.metadata()?.len() == 0 {
            return Ok(());
        }

        let mut reader = Checksum::new(&index_file);
        let entries_count = self.parse_header(&mut reader)?;
        self.parse_entries(entries_count, &mut reader)?;

        reader.verify()
    }

    fn parse_header(&self, reader: &mut Checksum<&File>) -> anyhow::Result<u32> {
        let header = IndexHeader::deserialize(reader.read(HEADER_SIZE)?)?;

        if header.marker != SIGNATURE {
            return Err(UgitError::corrupt("index", "invalid signature").into());
        }
        if header.version != VERSION {
            return Err(UgitError::corrupt(
                "index",
                format!("unsupported version {}", header.version),
            )
            .into());
        }

        Ok(header.entries_count)
    }

    fn parse_entries(
        &mut self,
        entries_count: u32,
        reader: &mut Checksum<&File>,
    ) -> anyhow::Result<()> {
        for _ in 0..entries_count {
            let fixed = reader.read(ENTRY_FIXED_SIZE)?;
            let path_len =
                byteorder::NetworkEndian::read_u16(&fixed[ENTRY_FIXED_SIZE - 2..]) as usize;
            let path = reader.read(path_len)?;

            let entry_bytes = [fixed.as_ref(), path.as_ref()].concat();
            let (entry, _) = IndexEntry::deserialize_from(&entry_bytes)?;

            self.store_entry(entry);
        }

        self.header.entries_count = entries_count;

        Ok(())
    }

    /// Persist the entries under an exclusive lock
    pub fn write_updates(&mut self) -> anyhow::Result<()> {
        let index_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        let _lock = file_guard::lock(&index_file, Lock::Exclusive, 0, 1)?;

        let mut file = &index_file;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;

        let mut writer = Checksum::new(file);

        self.header = IndexHeader {
            entries_count: self.entries.len() as u32,
            ..self.header.clone()
        };
        writer.write(&self.header.serialize()?)?;

        for entry in self.entries() {
            writer.write(&entry.serialize()?)?;
        }

        writer.write_checksum()?;
        file.sync_all()?;
        self.changed = false;

        Ok(())
    }

    /// Remove file entries that clash with `entry` becoming a file at its path
    fn discard_conflicts(&mut self, entry: &IndexEntry) {
        for parent in entry.parent_dirs() {
            self.remove_entry(parent);
        }
        self.remove_children(&entry.name);
    }

    fn store_entry(&mut self, entry: IndexEntry) {
        for parent in entry.parent_dirs() {
            self.children
                .entry(parent.to_path_buf())
                .or_default()
                .insert(entry.name.clone());
        }

        self.entries.insert(entry.name.clone(), entry);
    }

    fn remove_children(&mut self, path_name: &Path) {
        if let Some(children) = self.children.remove(path_name) {
            for child in children {
                self.remove_entry(&child);
            }
        }
    }

    fn remove_entry(&mut self, path_name: &Path) {
        if let Some(entry) = self.entries.remove(path_name) {
            for parent in entry.parent_dirs() {
                if let Some(children) = self.children.get_mut(parent) {
                    children.remove(path_name);
                    if children.is_empty() {
                        self.children.remove(parent);
                    }
                }
            }
        }
    }

    /// Insert or replace an entry; a file replaces a directory of the same name and vice versa
    pub fn add(&mut self, entry: IndexEntry) {
        self.discard_conflicts(&entry);
        self.store_entry(entry);
        self.changed = true;
    }

    /// Remove the entry at `path` or every entry below it when it names a directory
    ///
    /// The empty path removes everything.
    pub fn remove(&mut self, path: &Path) {
        if path.as_os_str().is_empty() {
            self.clear();
            return;
        }

        self.remove_entry(path);
        self.remove_children(path);
        self.changed = true;
    }

    /// Replace the whole contents with a flattened tree
    pub fn load_tree(&mut self, files: &BTreeMap<PathBuf, ObjectId>) {
        self.clear();
        for (path, oid) in files {
            self.store_entry(IndexEntry::clean(path.clone(), oid.clone()));
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub fn into_entries(self) -> impl Iterator<Item = IndexEntry> {
        self.entries.into_values()
    }

    /// Tracked file paths at or below `path` (every path for the empty path)
    pub fn entries_under(&self, path: &Path) -> Vec<PathBuf> {
        if path.as_os_str().is_empty() {
            return self.entries.keys().cloned().collect();
        }
        if self.entries.contains_key(path) {
            return vec![path.to_path_buf()];
        }

        self.children
            .get(path)
            .map(|children| children.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// True when `path` is a tracked file or a directory containing tracked files
    pub fn is_directly_tracked(&self, path: &Path) -> bool {
        self.entries.contains_key(path) || self.children.contains_key(path)
    }

    pub fn has_conflicts(&self) -> bool {
        self.entries.values().any(IndexEntry::is_conflicted)
    }

    pub fn conflicted_paths(&self) -> Vec<PathBuf> {
        self.entries
            .values()
            .filter(|entry| entry.is_conflicted())
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Flattened `path -> blob id` view, the input of tree building
    pub fn to_flat_tree(&self) -> BTreeMap<PathBuf, ObjectId> {
        self.entries
            .iter()
            .map(|(path, entry)| (path.clone(), entry.oid.clone()))
            .collect()
    }
}
