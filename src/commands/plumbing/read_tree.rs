use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::tree::walker::TreeWalker;
use std::path::Path;

impl Repository {
    /// Replace the whole index with the files of a tree, leaving the working tree alone
    pub fn read_tree(&self, tree_oid: &ObjectId) -> anyhow::Result<()> {
        let files = TreeWalker::new(self.database()).flatten(tree_oid)?;

        let _lock = self.lock_index()?;
        let mut index = self.index_mut();
        index.load_tree(&files);
        index.write_updates()
    }

    /// Make `dest` hold exactly the files of a tree
    ///
    /// Files below `dest` that the tree does not contain are removed, and the index entries
    /// below `dest` are replaced by the tree's files. The empty path restores onto the whole
    /// working tree. Local changes are overwritten without any check.
    pub fn restore_tree(&self, tree_oid: &ObjectId, dest: &Path) -> anyhow::Result<()> {
        let dest = self.workspace().normalize(dest)?;
        let files = TreeWalker::new(self.database()).flatten(tree_oid)?;

        let _lock = self.lock_index()?;

        for path in self.workspace().list_files(Some(&dest))? {
            let relative = path.strip_prefix(&dest)?;
            if !files.contains_key(relative) {
                self.workspace().remove_file(&path)?;
            }
        }

        let mut index = self.index_mut();
        index.remove(&dest);

        for (relative, oid) in &files {
            let path = dest.join(relative);
            let data = self.database().load_blob(oid)?.into_content();

            let unchanged =
                self.workspace().is_file(&path) && self.workspace().read_file(&path)? == data;
            if !unchanged {
                self.workspace().write_file(&path, &data)?;
            }
            index.add(IndexEntry::clean(path, oid.clone()));
        }

        index.write_updates()
    }
}
