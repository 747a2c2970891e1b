//! Content-addressed object store
//!
//! Objects are framed (`<type> <len>\0<payload>`), hashed, and written uncompressed to
//! `objects/<2 hex>/<38 hex>`. Writes go through a temp file in the fan-out directory which is
//! synced and atomically renamed into place, so a stored object is either complete or absent.

use crate::artifacts::objects::blob::Blob;
use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::object::{self, Object, ObjectBox, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::objects::tree::Tree;
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::errors::UgitError;
use anyhow::Context;
use bytes::Bytes;
use fake::rand;
use sha1::{Digest, Sha1};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
    /// Parent lists of commits already visited by graph queries
    commit_cache: RefCell<HashMap<ObjectId, Vec<ObjectId>>>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database {
            path,
            commit_cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    /// Store `payload` as an object of `object_type` and return its id
    ///
    /// Idempotent: an object that already exists is not rewritten.
    pub fn put(&self, object_type: ObjectType, payload: &[u8]) -> anyhow::Result<ObjectId> {
        let (oid, framed) = object::digest(object_type, payload)?;
        let object_path = self.path.join(oid.to_path());

        if !object_path.exists() {
            self.write_object(&object_path, &framed)?;
        }

        Ok(oid)
    }

    pub fn store(&self, object: &impl Object) -> anyhow::Result<ObjectId> {
        self.put(object.object_type(), &object.serialize()?)
    }

    pub fn exists(&self, object_id: &ObjectId) -> bool {
        self.path.join(object_id.to_path()).is_file()
    }

    /// Load an object, verifying that the stored bytes still hash to `object_id`
    pub fn get(&self, object_id: &ObjectId) -> anyhow::Result<(ObjectType, Bytes)> {
        let object_path = self.path.join(object_id.to_path());
        if !object_path.is_file() {
            return Err(UgitError::not_found("object", object_id).into());
        }

        let framed = std::fs::read(&object_path)
            .with_context(|| format!("Unable to read object file {}", object_path.display()))?;

        let actual = ObjectId::from_digest(&Sha1::digest(&framed))?;
        if &actual != object_id {
            return Err(UgitError::corrupt(object_id, format!("content hashes to {actual}")).into());
        }

        let (object_type, declared_len, offset) =
            ObjectType::parse_header(&framed, object_id.as_ref())?;
        let payload = Bytes::from(framed).slice(offset..);
        if payload.len() != declared_len {
            return Err(UgitError::corrupt(
                object_id,
                format!("declared {declared_len} bytes, found {}", payload.len()),
            )
            .into());
        }

        Ok((object_type, payload))
    }

    pub fn object_type(&self, object_id: &ObjectId) -> anyhow::Result<ObjectType> {
        Ok(self.get(object_id)?.0)
    }

    pub fn parse_object(&self, object_id: &ObjectId) -> anyhow::Result<ObjectBox> {
        let (object_type, payload) = self.get(object_id)?;

        let parsed = match object_type {
            ObjectType::Blob => Blob::deserialize(payload).map(|b| ObjectBox::Blob(Box::new(b))),
            ObjectType::Tree => Tree::deserialize(payload).map(|t| ObjectBox::Tree(Box::new(t))),
            ObjectType::Commit => {
                Commit::deserialize(payload).map(|c| ObjectBox::Commit(Box::new(c)))
            }
        };

        parsed.map_err(|error| UgitError::corrupt(object_id, format!("{error:#}")).into())
    }

    pub fn parse_object_as_blob(&self, object_id: &ObjectId) -> anyhow::Result<Option<Blob>> {
        match self.parse_object(object_id)? {
            ObjectBox::Blob(blob) => Ok(Some(*blob)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_tree(&self, object_id: &ObjectId) -> anyhow::Result<Option<Tree>> {
        match self.parse_object(object_id)? {
            ObjectBox::Tree(tree) => Ok(Some(*tree)),
            _ => Ok(None),
        }
    }

    pub fn parse_object_as_commit(&self, object_id: &ObjectId) -> anyhow::Result<Option<Commit>> {
        match self.parse_object(object_id)? {
            ObjectBox::Commit(commit) => Ok(Some(*commit)),
            _ => Ok(None),
        }
    }

    /// Load a blob; an object of another type is reported as corrupt
    pub fn load_blob(&self, object_id: &ObjectId) -> anyhow::Result<Blob> {
        self.parse_object_as_blob(object_id)?
            .ok_or_else(|| self.wrong_type(object_id, ObjectType::Blob))
    }

    pub fn load_tree(&self, object_id: &ObjectId) -> anyhow::Result<Tree> {
        self.parse_object_as_tree(object_id)?
            .ok_or_else(|| self.wrong_type(object_id, ObjectType::Tree))
    }

    pub fn load_commit(&self, object_id: &ObjectId) -> anyhow::Result<Commit> {
        self.parse_object_as_commit(object_id)?
            .ok_or_else(|| self.wrong_type(object_id, ObjectType::Commit))
    }

    /// Parents of a commit, memoized for repeated graph traversals
    pub fn commit_parents(&self, object_id: &ObjectId) -> anyhow::Result<Vec<ObjectId>> {
        if let Some(parents) = self.commit_cache.borrow().get(object_id) {
            return Ok(parents.clone());
        }

        let parents = self.load_commit(object_id)?.parents().to_vec();
        self.commit_cache
            .borrow_mut()
            .insert(object_id.clone(), parents.clone());

        Ok(parents)
    }

    fn wrong_type(&self, object_id: &ObjectId, expected: ObjectType) -> anyhow::Error {
        let found = self
            .object_type(object_id)
            .map(|found| found.to_string())
            .unwrap_or_else(|_| "unreadable object".to_string());

        UgitError::corrupt(object_id, format!("expected {expected}, found {found}")).into()
    }

    /// Find every stored object whose id starts with `prefix`
    pub fn find_objects_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<ObjectId>> {
        let prefix = prefix.to_ascii_lowercase();
        if prefix.len() > OBJECT_ID_LENGTH || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(Vec::new());
        }

        let dirs: Vec<String> = if prefix.len() >= 2 {
            vec![prefix[..2].to_string()]
        } else {
            (0..=255u8).map(|i| format!("{i:02x}")).collect()
        };

        let mut matches = Vec::new();
        for dir_name in dirs {
            let dir_path = self.path.join(&dir_name);
            if !dir_path.is_dir() {
                continue;
            }

            for entry in std::fs::read_dir(&dir_path)? {
                let entry = entry?;
                let full_oid = format!("{}{}", dir_name, entry.file_name().to_string_lossy());

                if full_oid.starts_with(&prefix)
                    && let Ok(oid) = ObjectId::try_parse(full_oid)
                {
                    matches.push(oid);
                }
            }
        }
        matches.sort();

        Ok(matches)
    }

    fn write_object(&self, object_path: &Path, framed: &[u8]) -> anyhow::Result<()> {
        let object_dir = object_path
            .parent()
            .with_context(|| format!("Invalid object path {}", object_path.display()))?;
        std::fs::create_dir_all(object_dir).with_context(|| {
            format!("Unable to create object directory {}", object_dir.display())
        })?;

        let temp_object_path = object_dir.join(Self::generate_temp_name());
        let result = Self::write_synced(&temp_object_path, framed).and_then(|_| {
            std::fs::rename(&temp_object_path, object_path).with_context(|| {
                format!("Unable to rename object file to {}", object_path.display())
            })
        });

        if result.is_err() {
            let _ = std::fs::remove_file(&temp_object_path);
        }
        result?;

        // make the rename itself durable
        if let Ok(dir) = std::fs::File::open(object_dir) {
            let _ = dir.sync_all();
        }

        Ok(())
    }

    fn write_synced(path: &Path, content: &[u8]) -> anyhow::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| format!("Unable to open object file {}", path.display()))?;

        file.write_all(content)
            .with_context(|| format!("Unable to write object file {}", path.display()))?;
        file.sync_all()
            .with_context(|| format!("Unable to sync object file {}", path.display()))?;

        Ok(())
    }

    fn generate_temp_name() -> String {
        format!("tmp-obj-{}", rand::random::<u32>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects").into_boxed_path());
        (dir, database)
    }

    #[rstest]
    fn put_is_idempotent(store: (TempDir, Database)) {
        let (_dir, database) = store;

        let first = database.put(ObjectType::Blob, b"same bytes").unwrap();
        let second = database.put(ObjectType::Blob, b"same bytes").unwrap();

        assert_eq!(first, second);
        assert!(database.exists(&first));
        assert_eq!(database.find_objects_by_prefix(&first.as_ref()[..6]).unwrap(), vec![first]);
    }

    #[rstest]
    fn get_returns_type_and_payload(store: (TempDir, Database)) {
        let (_dir, database) = store;
        let oid = database.put(ObjectType::Commit, b"payload").unwrap();

        let (object_type, payload) = database.get(&oid).unwrap();

        assert_eq!(object_type, ObjectType::Commit);
        assert_eq!(payload.as_ref(), b"payload");
    }

    #[rstest]
    fn missing_object_is_not_found(store: (TempDir, Database)) {
        let (_dir, database) = store;
        let oid = ObjectId::try_parse("e69de29bb2d1d6434b8b29ae775ad8c2e48c5391").unwrap();

        let error = database.get(&oid).unwrap_err();

        assert!(matches!(UgitError::kind_of(&error), Some(UgitError::NotFound { .. })));
    }

    #[rstest]
    fn tampered_object_is_corrupt(store: (TempDir, Database)) {
        let (_dir, database) = store;
        let oid = database.put(ObjectType::Blob, b"original").unwrap();
        std::fs::write(database.objects_path().join(oid.to_path()), b"blob 8\0tampered").unwrap();

        let error = database.get(&oid).unwrap_err();

        assert!(matches!(
            UgitError::kind_of(&error),
            Some(UgitError::CorruptObject { .. })
        ));
    }

    #[rstest]
    fn loading_with_the_wrong_type_is_rejected(store: (TempDir, Database)) {
        let (_dir, database) = store;
        let oid = database.put(ObjectType::Blob, b"not a tree").unwrap();

        assert!(database.load_tree(&oid).is_err());
        assert!(database.parse_object_as_tree(&oid).unwrap().is_none());
        assert!(database.load_blob(&oid).is_ok());
    }
}
