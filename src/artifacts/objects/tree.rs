//! Directory snapshot object
//!
//! ## Format
//!
//! The payload is a concatenation of entries sorted by name, each encoded as
//! `<kind> <name>\0<20-byte id>` where `kind` is `blob` or `tree`.
//!
//! A tree node owns only the ids of its children; nesting is resolved by loading the child
//! trees from the database on demand.

use crate::artifacts::database::database_entry::{DatabaseEntry, EntryKind};
use crate::artifacts::objects::object::{Object, Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::UgitError;
use anyhow::Context;
use bytes::{Buf, Bytes};
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<String, DatabaseEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry called `name`
    pub fn insert(&mut self, name: impl Into<String>, entry: DatabaseEntry) -> anyhow::Result<()> {
        let name = name.into();
        Self::validate_name(&name)?;
        self.entries.insert(name, entry);

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&DatabaseEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &DatabaseEntry)> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, DatabaseEntry)> {
        self.entries.into_iter()
    }

    fn validate_name(name: &str) -> anyhow::Result<()> {
        let reason = if name.is_empty() {
            Some("empty entry name")
        } else if name == "." || name == ".." {
            Some("relative entry name")
        } else if name.contains('/') || name.contains('\0') {
            Some("entry name contains a separator")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(UgitError::InvalidName {
                name: name.to_string(),
                reason: reason.to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

impl Packable for Tree {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut payload = Vec::new();

        for (name, entry) in &self.entries {
            write!(payload, "{} {}\0", entry.kind.as_str(), name)?;
            entry.oid.write_binary_to(&mut payload)?;
        }

        Ok(Bytes::from(payload))
    }
}

impl Unpackable for Tree {
    fn deserialize(payload: Bytes) -> anyhow::Result<Self> {
        let mut tree = Tree::new();
        let mut reader = payload.reader();

        let mut kind_bytes = Vec::new();
        let mut name_bytes = Vec::new();
        let mut previous: Option<String> = None;

        loop {
            kind_bytes.clear();
            if reader.read_until(b' ', &mut kind_bytes)? == 0 {
                break;
            }
            if kind_bytes.pop() != Some(b' ') {
                anyhow::bail!("unexpected end of tree entry kind");
            }
            let kind = EntryKind::try_from(std::str::from_utf8(&kind_bytes)?)?;

            name_bytes.clear();
            reader.read_until(b'\0', &mut name_bytes)?;
            if name_bytes.pop() != Some(b'\0') {
                anyhow::bail!("unexpected end of tree entry name");
            }
            let name = String::from_utf8(name_bytes.clone())?;

            let oid = ObjectId::read_binary_from(&mut reader)
                .context("unexpected end of tree entry id")?;

            if previous.as_ref().is_some_and(|previous| previous >= &name) {
                anyhow::bail!("tree entries are not sorted at '{name}'");
            }
            previous = Some(name.clone());

            tree.insert(name, DatabaseEntry::new(oid, kind))?;
        }

        Ok(tree)
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.entries
            .iter()
            .map(|(name, entry)| format!("{} {}\t{}", entry.kind.as_str(), entry.oid, name))
            .collect::<Vec<String>>()
            .join("\n")
    }
}
