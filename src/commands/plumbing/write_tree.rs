use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use crate::artifacts::tree::FlatTree;
use crate::artifacts::tree::builder::TreeBuilder;
use crate::errors::UgitError;
use std::path::Path;

impl Repository {
    /// Fold the index into tree objects and return the root tree id
    ///
    /// Refused while the index still holds conflicted entries.
    pub fn write_tree(&self) -> anyhow::Result<ObjectId> {
        self.load_index()?;
        let tree_oid = self.write_index_tree()?;

        writeln!(self.writer(), "{tree_oid}")?;

        Ok(tree_oid)
    }

    /// Store every regular file below `root` and the directories holding them
    ///
    /// Paths inside the resulting tree are relative to `root`. Empty directories and symlinks
    /// leave no trace.
    pub fn build_tree(&self, root: &Path) -> anyhow::Result<ObjectId> {
        let root = self.workspace().normalize(root)?;
        if !self.workspace().is_dir(&root) {
            return Err(UgitError::not_found("directory", root.display()).into());
        }

        let mut files = FlatTree::new();
        for path in self.workspace().list_files(Some(&root))? {
            let data = self.workspace().read_file(&path)?;
            let oid = self.database().put(ObjectType::Blob, &data)?;

            let relative = path.strip_prefix(&root)?.to_path_buf();
            files.insert(relative, oid);
        }

        self.store_flat_tree(&files)
    }

    pub(crate) fn write_index_tree(&self) -> anyhow::Result<ObjectId> {
        let index = self.index();
        if index.has_conflicts() {
            let paths = index
                .conflicted_paths()
                .iter()
                .map(|path| format!("\t{}", path.display()))
                .collect::<Vec<_>>()
                .join("\n");
            return Err(UgitError::Conflict(format!(
                "unresolved conflicts in the index:\n{paths}\nstage the resolved files first"
            ))
            .into());
        }

        self.store_flat_tree(&index.to_flat_tree())
    }

    pub(crate) fn store_flat_tree(&self, files: &FlatTree) -> anyhow::Result<ObjectId> {
        TreeBuilder::from_files(files)?.build(|tree| self.database().store(tree))
    }
}
