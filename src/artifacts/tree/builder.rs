use crate::artifacts::database::database_entry::{DatabaseEntry, EntryKind};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::tree::Tree;
use crate::errors::UgitError;
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Builds nested trees from flat file paths
///
/// Every directory that holds at least one file gets a [`Tree`] node keyed by its path. The
/// nodes are then folded from the deepest directory upwards; each stored child contributes
/// only its id to the parent node.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    directories: BTreeMap<PathBuf, Tree>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        let mut directories = BTreeMap::new();
        directories.insert(PathBuf::new(), Tree::new());

        TreeBuilder { directories }
    }

    pub fn from_files<'a>(
        files: impl IntoIterator<Item = (&'a PathBuf, &'a ObjectId)>,
    ) -> anyhow::Result<Self> {
        let mut builder = Self::new();
        for (path, oid) in files {
            builder.add_file(path, oid.clone())?;
        }

        Ok(builder)
    }

    pub fn add_file(&mut self, path: &Path, oid: ObjectId) -> anyhow::Result<()> {
        let name = Self::file_name(path)?;
        let parent = path.parent().unwrap_or(Path::new("")).to_path_buf();

        for ancestor in parent.ancestors() {
            self.directories.entry(ancestor.to_path_buf()).or_default();
        }

        let tree = self
            .directories
            .get_mut(&parent)
            .with_context(|| format!("directory {} was not registered", parent.display()))?;
        if tree.get(&name).is_some_and(DatabaseEntry::is_tree) {
            return Err(UgitError::invalid_path(path, "is both a file and a directory").into());
        }

        tree.insert(name, DatabaseEntry::new(oid, EntryKind::Blob))
    }

    fn file_name(path: &Path) -> anyhow::Result<String> {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| UgitError::invalid_path(path, "has no file name").into())
    }

    /// Store every tree through `store` and return the root tree id
    pub fn build<F>(self, mut store: F) -> anyhow::Result<ObjectId>
    where
        F: FnMut(&Tree) -> anyhow::Result<ObjectId>,
    {
        let mut directories = self.directories;

        let mut order = directories.keys().cloned().collect::<Vec<_>>();
        order.sort_by_key(|path| std::cmp::Reverse(path.components().count()));

        for path in order {
            let tree = directories
                .remove(&path)
                .with_context(|| format!("directory {} was folded twice", path.display()))?;
            let oid = store(&tree)?;

            let Some(parent) = path.parent() else {
                return Ok(oid);
            };

            let name = Self::file_name(&path)?;
            let parent_tree = directories
                .get_mut(parent)
                .with_context(|| format!("missing parent directory for {}", path.display()))?;
            if parent_tree.get(&name).is_some_and(|entry| !entry.is_tree()) {
                return Err(UgitError::invalid_path(&path, "is both a file and a directory").into());
            }
            parent_tree.insert(name, DatabaseEntry::new(oid, EntryKind::Tree))?;
        }

        anyhow::bail!("tree builder has no root directory")
    }
}
