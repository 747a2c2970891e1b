use crate::areas::repository::Repository;
use crate::artifacts::index::index_entry::IndexEntry;
use crate::artifacts::objects::object_type::ObjectType;
use crate::errors::UgitError;
use std::path::{Path, PathBuf};

impl Repository {
    /// Stage the current working-tree content of `paths`
    ///
    /// A directory stages every file below it. Tracked files that are gone from the working
    /// tree are dropped from the index. Staging a path clears its conflict flag.
    pub fn stage<P: AsRef<Path>>(&self, paths: &[P]) -> anyhow::Result<()> {
        let _lock = self.lock_index()?;

        let paths = self.normalize_all(paths)?;
        for path in &paths {
            let files = self.workspace().list_files(Some(path))?;
            let tracked = self.index().entries_under(path);

            if files.is_empty() && tracked.is_empty() {
                return Err(UgitError::not_found("path", path.display()).into());
            }

            for file in &files {
                let data = self.workspace().read_file(file)?;
                let oid = self.database().put(ObjectType::Blob, &data)?;
                self.index_mut().add(IndexEntry::clean(file.clone(), oid));
            }

            for gone in tracked.iter().filter(|tracked| !self.workspace().is_file(tracked)) {
                self.index_mut().remove(gone);
            }
        }

        self.index_mut().write_updates()
    }

    /// Drop `paths` (and everything below directories) from the index
    ///
    /// The working tree is left untouched.
    pub fn unstage<P: AsRef<Path>>(&self, paths: &[P]) -> anyhow::Result<()> {
        let _lock = self.lock_index()?;

        let paths = self.normalize_all(paths)?;
        for path in &paths {
            if self.index().entries_under(path).is_empty() {
                return Err(UgitError::not_found("tracked path", path.display()).into());
            }
            self.index_mut().remove(path);
        }

        self.index_mut().write_updates()
    }

    fn normalize_all<P: AsRef<Path>>(&self, paths: &[P]) -> anyhow::Result<Vec<PathBuf>> {
        paths
            .iter()
            .map(|path| self.workspace().normalize(path.as_ref()))
            .collect()
    }
}
