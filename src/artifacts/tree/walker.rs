use crate::areas::database::Database;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::tree::FlatTree;
use std::path::PathBuf;

/// Iterative traversal of stored trees
#[derive(Debug)]
pub struct TreeWalker<'d> {
    database: &'d Database,
}

impl<'d> TreeWalker<'d> {
    pub fn new(database: &'d Database) -> Self {
        TreeWalker { database }
    }

    /// Every entry reachable from `root`, trees included, in path order
    pub fn walk(&self, root: &ObjectId) -> anyhow::Result<Vec<(PathBuf, DatabaseEntry)>> {
        let mut entries = Vec::new();
        let mut stack = vec![(PathBuf::new(), root.clone())];

        while let Some((prefix, oid)) = stack.pop() {
            let tree = self.database.load_tree(&oid)?;

            for (name, entry) in tree.into_entries() {
                let path = prefix.join(name);
                if entry.is_tree() {
                    stack.push((path.clone(), entry.oid.clone()));
                }
                entries.push((path, entry));
            }
        }
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));

        Ok(entries)
    }

    /// Only the top level of `root`
    pub fn list(&self, root: &ObjectId) -> anyhow::Result<Vec<(PathBuf, DatabaseEntry)>> {
        Ok(self
            .database
            .load_tree(root)?
            .into_entries()
            .map(|(name, entry)| (PathBuf::from(name), entry))
            .collect())
    }

    /// `path -> blob id` for every file in the snapshot
    pub fn flatten(&self, root: &ObjectId) -> anyhow::Result<FlatTree> {
        Ok(self
            .walk(root)?
            .into_iter()
            .filter(|(_, entry)| !entry.is_tree())
            .map(|(path, entry)| (path, entry.oid))
            .collect())
    }

    /// Flatten the tree of a commit, or nothing for an unborn branch
    pub fn flatten_commit(&self, commit: Option<&ObjectId>) -> anyhow::Result<FlatTree> {
        match commit {
            Some(commit) => {
                let commit = self.database.load_commit(commit)?;
                self.flatten(commit.tree_oid())
            }
            None => Ok(FlatTree::new()),
        }
    }
}
