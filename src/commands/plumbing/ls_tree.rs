use crate::areas::repository::Repository;
use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::tree::walker::TreeWalker;
use std::path::PathBuf;

impl Repository {
    /// List the entries of a tree (or of a commit's tree), descending when `recursive`
    ///
    /// Recursive listings show files only, like a flattened snapshot.
    pub fn ls_tree(
        &self,
        tree_ish: &str,
        recursive: bool,
    ) -> anyhow::Result<Vec<(PathBuf, DatabaseEntry)>> {
        let tree_oid = self.resolve_tree(tree_ish)?;
        let walker = TreeWalker::new(self.database());

        let entries = if recursive {
            walker
                .walk(&tree_oid)?
                .into_iter()
                .filter(|(_, entry)| !entry.is_tree())
                .collect()
        } else {
            walker.list(&tree_oid)?
        };

        for (path, entry) in &entries {
            writeln!(
                self.writer(),
                "{} {}\t{}",
                entry.kind.as_str(),
                entry.oid,
                path.display()
            )?;
        }

        Ok(entries)
    }
}
